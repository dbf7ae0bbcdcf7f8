//! Change-driven refresh session
//!
//! A [`Session`] remembers the change token of the image on screen. Each
//! [`poll`](Session::poll) asks a [`MetadataSource`] for the current token
//! and runs a full power cycle through [`Panel::present`] only when it
//! differs. The token is committed after a successful update, so a failed
//! update is retried on the next poll.
//!
//! ## Example
//!
//! ```rust,no_run
//! use epd_13in3e::{ChangeToken, Session, TokenStore};
//! # use core::convert::Infallible;
//! struct Nvs;
//! impl TokenStore for Nvs {
//!     type Error = Infallible;
//!     fn load(&mut self) -> Result<Option<ChangeToken>, Infallible> { Ok(None) }
//!     fn save(&mut self, _token: &str) -> Result<(), Infallible> { Ok(()) }
//! }
//!
//! let session = Session::new(Nvs);
//! assert!(session.token().is_none());
//! ```

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::error::Error;
use crate::interface::PanelInterface;
use crate::panel::{KeepAlive, Panel};
use crate::source::LineSource;

/// Longest change token kept, in bytes
pub const TOKEN_CAPACITY: usize = 64;

/// Opaque identity of the image last shown
pub type ChangeToken = heapless::String<TOKEN_CAPACITY>;

/// Supplier of the current change token (e.g. an HTTP metadata endpoint)
pub trait MetadataSource {
    /// Error type for a failed fetch
    type Error: Debug;

    /// Fetch the token of the image currently published
    fn fetch_token(&mut self) -> Result<&str, Self::Error>;
}

/// Supplier of the image stream
pub trait ImageSource {
    /// Error type for a failed open
    type Error: Debug;

    /// Line source over one full image in wire format
    type Lines<'a>: LineSource
    where
        Self: 'a;

    /// Start streaming the current image
    fn open(&mut self) -> Result<Self::Lines<'_>, Self::Error>;
}

/// Stable storage for the last committed token
pub trait TokenStore {
    /// Error type for storage access
    type Error: Debug;

    /// Token saved by a previous boot, if any
    fn load(&mut self) -> Result<Option<ChangeToken>, Self::Error>;

    /// Persist `token`
    fn save(&mut self, token: &str) -> Result<(), Self::Error>;
}

/// Token store that keeps nothing across boots
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStore;

impl TokenStore for NoStore {
    type Error = core::convert::Infallible;

    fn load(&mut self) -> Result<Option<ChangeToken>, Self::Error> {
        Ok(None)
    }

    fn save(&mut self, _token: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Result of a [`Session::poll`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The token matched; the panel was not touched
    Unchanged,
    /// A new image was drawn and its token committed
    Rendered,
}

/// Errors from a session poll
#[derive(Debug, thiserror::Error)]
pub enum SyncError<E, M, S> {
    /// The metadata fetch failed
    #[error("metadata fetch failed: {0:?}")]
    Metadata(M),
    /// The fetched token does not fit in a [`ChangeToken`]
    #[error("change token of {len} bytes is too long")]
    TokenTooLong {
        /// Length of the rejected token
        len: usize,
    },
    /// The image stream could not be opened
    #[error("image fetch failed: {0:?}")]
    Image(S),
    /// The panel update failed; the panel has been powered off
    #[error("panel update failed: {0}")]
    Panel(Error<E>),
}

type PollError<I, M, G> = SyncError<
    <I as PanelInterface>::Error,
    <M as MetadataSource>::Error,
    <G as ImageSource>::Error,
>;

/// Explicit state of the fetch-and-render loop
pub struct Session<S = NoStore> {
    store: S,
    token: Option<ChangeToken>,
}

impl Session<NoStore> {
    /// Session without persistence; the first poll always renders
    pub fn volatile() -> Self {
        Self {
            store: NoStore,
            token: None,
        }
    }
}

impl<S: TokenStore> Session<S> {
    /// Create a session, restoring the last token from `store`
    ///
    /// A failing store is logged and treated as empty.
    pub fn new(mut store: S) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("token store unreadable: {:?}", e);
                None
            }
        };
        Self { store, token }
    }

    /// Token of the image on screen
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Forget the current token so the next poll renders
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Give back the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Check for a new image and show it if there is one
    ///
    /// The panel must be `PoweredOff`; it is powered only for the update.
    pub fn poll<I, K, M, G, D>(
        &mut self,
        panel: &mut Panel<I, K>,
        metadata: &mut M,
        images: &mut G,
        delay: &mut D,
    ) -> Result<PollOutcome, PollError<I, M, G>>
    where
        I: PanelInterface,
        K: KeepAlive,
        M: MetadataSource,
        G: ImageSource,
        D: DelayNs,
    {
        let fetched = metadata
            .fetch_token()
            .map_err(PollError::<I, M, G>::Metadata)?;
        let mut token = ChangeToken::new();
        if token.push_str(fetched).is_err() {
            return Err(SyncError::TokenTooLong { len: fetched.len() });
        }

        if self.token.as_ref() == Some(&token) {
            debug!("image unchanged ({})", token.as_str());
            return Ok(PollOutcome::Unchanged);
        }
        info!("new image {}", token.as_str());

        let mut lines = images.open().map_err(PollError::<I, M, G>::Image)?;
        panel
            .present(&mut lines, delay)
            .map_err(PollError::<I, M, G>::Panel)?;

        if let Err(e) = self.store.save(&token) {
            warn!("token not persisted: {:?}", e);
        }
        self.token = Some(token);
        Ok(PollOutcome::Rendered)
    }
}
