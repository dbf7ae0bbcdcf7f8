//! Recording test doubles for the panel interface and delay

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::command::Target;
use crate::interface::PanelInterface;

/// Delay that records every millisecond request
#[derive(Debug, Default)]
pub(crate) struct MockDelay {
    pub delays_ms: Vec<u32>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Park,
    Select(Target),
    DeselectAll,
    Write(Vec<u8>),
    Reset { pulse_ms: u32 },
    Power(bool),
    Poll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockError;

/// Interface that records traffic and tracks chip-select levels
#[derive(Debug, Default)]
pub(crate) struct MockInterface {
    pub events: Vec<Event>,
    pub cs_master: bool,
    pub cs_slave: bool,
    /// A single-controller select happened while the other CS was asserted
    pub overlap: bool,
    pub master_bytes: usize,
    pub slave_bytes: usize,
    pub powered: bool,
    pub polls: usize,
    /// Busy line samples, `true` = ready; falls back to `!stuck_busy`
    pub busy_script: VecDeque<bool>,
    pub stuck_busy: bool,
    /// Number of writes that succeed before every write fails
    pub fail_writes_after: Option<usize>,
    /// Every `deselect_all` fails and leaves the chip-selects as they are
    pub fail_deselect: bool,
    writes: usize,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn busy_for(polls: usize) -> Self {
        let mut interface = Self::new();
        interface.busy_script.extend(core::iter::repeat_n(false, polls));
        interface
    }

    pub fn any_selected(&self) -> bool {
        self.cs_master || self.cs_slave
    }

    /// Each chip-select window as (target, opcode, bytes after the opcode)
    pub fn commands(&self) -> Vec<(Target, u8, Vec<u8>)> {
        let mut windows: Vec<(Target, Option<u8>, Vec<u8>)> = Vec::new();
        let mut open = false;
        for event in &self.events {
            match event {
                Event::Select(target) => {
                    open = true;
                    windows.push((*target, None, Vec::new()));
                }
                Event::Write(bytes) if open => {
                    if let Some((_, opcode, rest)) = windows.last_mut() {
                        match (opcode.is_none(), bytes.split_first()) {
                            (true, Some((&first, tail))) => {
                                *opcode = Some(first);
                                rest.extend_from_slice(tail);
                            }
                            _ => rest.extend_from_slice(bytes),
                        }
                    }
                }
                Event::DeselectAll => open = false,
                _ => {}
            }
        }
        windows
            .into_iter()
            .filter_map(|(target, opcode, rest)| opcode.map(|op| (target, op, rest)))
            .collect()
    }

    /// Opcodes in the order they were sent
    pub fn opcodes(&self) -> Vec<(Target, u8)> {
        self.commands()
            .into_iter()
            .map(|(target, opcode, _)| (target, opcode))
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
        self.master_bytes = 0;
        self.slave_bytes = 0;
        self.polls = 0;
        self.writes = 0;
    }
}

impl PanelInterface for MockInterface {
    type Error = MockError;

    fn park(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Park);
        self.cs_master = false;
        self.cs_slave = false;
        Ok(())
    }

    fn select(&mut self, target: Target) -> Result<(), Self::Error> {
        self.events.push(Event::Select(target));
        match target {
            Target::Master => {
                self.overlap |= self.cs_slave;
                self.cs_master = true;
            }
            Target::Slave => {
                self.overlap |= self.cs_master;
                self.cs_slave = true;
            }
            Target::Both => {
                self.cs_master = true;
                self.cs_slave = true;
            }
        }
        Ok(())
    }

    fn deselect_all(&mut self) -> Result<(), Self::Error> {
        if self.fail_deselect {
            return Err(MockError);
        }
        self.events.push(Event::DeselectAll);
        self.cs_master = false;
        self.cs_slave = false;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes_after.is_some_and(|limit| self.writes >= limit) {
            return Err(MockError);
        }
        self.writes += 1;
        self.events.push(Event::Write(data.to_vec()));
        if self.cs_master {
            self.master_bytes += data.len();
        }
        if self.cs_slave {
            self.slave_bytes += data.len();
        }
        Ok(())
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D, pulse_ms: u32) -> Result<(), Self::Error> {
        self.events.push(Event::Reset { pulse_ms });
        for _ in 0..5 {
            delay.delay_ms(pulse_ms);
        }
        Ok(())
    }

    fn is_ready(&mut self) -> Result<bool, Self::Error> {
        self.events.push(Event::Poll);
        self.polls += 1;
        Ok(self.busy_script.pop_front().unwrap_or(!self.stuck_busy))
    }

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        self.events.push(Event::Power(on));
        self.powered = on;
        Ok(())
    }
}
