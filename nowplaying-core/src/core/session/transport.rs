use crate::core::session::{
    ButtonEnablement, ButtonEvent, EventBridge, MediaProperties, Result, Thumbnail, Timeline,
};

use derive_more::Display;
use std::fmt::Debug;

/// The subscription of an [EventBridge] on the button-press notifications of the OS.
/// A token can only be obtained from [MediaTransport::subscribe] and is consumed by
/// [MediaTransport::unsubscribe], so it's released at most once.
#[derive(Debug, Display, PartialEq, Eq)]
#[display("{}", _0)]
pub struct RegistrationToken(i64);

impl RegistrationToken {
    /// Create a new token for the given platform registration value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The platform registration value of the token.
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// The entry point of the OS into the [EventBridge].
///
/// Platforms invoke [ButtonSink::press] from their own notification thread(s).
/// The sink never blocks on application code.
#[derive(Debug, Clone)]
pub struct ButtonSink {
    bridge: EventBridge,
}

impl ButtonSink {
    pub(crate) fn new(bridge: EventBridge) -> Self {
        Self { bridge }
    }

    /// Forward the pressed button to the bound button handler, if any.
    pub fn press(&self, button: ButtonEvent) {
        self.bridge.press(button);
    }
}

/// The OS transport control session.
///
/// An instance represents an acquired OS session, the acquisition itself is done by the platform
/// specific constructor, which should also disable any default command handling of the OS so that
/// all transport commands are surfaced through [MediaTransport::subscribe].
pub trait MediaTransport: Debug + Send {
    /// Subscribe the given sink to the button-press notifications of the OS.
    ///
    /// It returns the registration of the subscription.
    fn subscribe(&mut self, sink: ButtonSink) -> Result<RegistrationToken>;

    /// Remove the subscription of the given registration from the OS.
    fn unsubscribe(&mut self, token: RegistrationToken) -> Result<()>;

    /// Enable or disable each transport button on the OS surface.
    fn set_button_enablement(&mut self, buttons: &ButtonEnablement) -> Result<()>;

    /// Apply the given media properties as a single update to the OS surface.
    fn set_media_properties(&mut self, properties: &MediaProperties) -> Result<()>;

    /// Apply the given thumbnail to the OS surface.
    fn set_thumbnail(&mut self, thumbnail: &Thumbnail) -> Result<()>;

    /// Apply the given playback progress to the OS surface.
    fn set_timeline(&mut self, timeline: &Timeline) -> Result<()>;

    /// Release the OS session.
    /// No other operation is invoked on the transport after this call.
    fn release(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_token_value() {
        let token = RegistrationToken::new(42);

        assert_eq!(42, token.value());
        assert_eq!("42", token.to_string());
    }
}
