use std::fmt;
use std::sync::Arc;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;
use thiserror::Error;
use tracing::info;

use super::{Action, Parameter};
use crate::ActionError;

pub(super) const FUNCTION: &str = "SendEmail";
pub(super) const DEFAULT_FROM: &str = "Rules Engine <rules-engine@localhost.localdomain>";

const TO_PARAMETER: &str = "Send Email to";
const CC_PARAMETER: &str = "Copy Email to";
const SUBJECT: &str = "Rules Engine";
const BODY: &str = "An applicable rule sent this message.";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct MailError(pub String);

/// Transport used by [`SendEmail`] to deliver messages.
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`MailError`] if the message could not be delivered.
    fn send(&self, message: &Message) -> Result<(), MailError>;
}

/// A [`Mailer`] that records each message as a tracing event instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let envelope = message.envelope();
        info!(from = ?envelope.from(), to = ?envelope.to(), "email dispatched");
        Ok(())
    }
}

/// Sends a fixed notification to the `"Send Email to"` and `"Copy Email to"`
/// recipients.
pub struct SendEmail {
    mailer: Arc<dyn Mailer>,
    from: String,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    parameters: Vec<Parameter>,
}

impl SendEmail {
    /// `from` accepts either a bare address or `Name <address>`. It is
    /// parsed when the message is built.
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
            to: Vec::new(),
            cc: Vec::new(),
            parameters: Vec::new(),
        }
    }

    fn message(&self) -> Result<Message, ActionError> {
        let failed = |reason: String| ActionError::ExecutionFailed(format!("{FUNCTION} - {reason}"));
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e: AddressError| failed(format!("invalid sender '{}': {e}", self.from)))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN);
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in &self.cc {
            builder = builder.cc(mailbox.clone());
        }
        builder
            .body(BODY.to_owned())
            .map_err(|e| failed(format!("unable to build the message: {e}")))
    }
}

/// Mailbox parsing allows empty dot-atoms in the local part; a strict
/// address does not.
fn strict_local_part(mailbox: &Mailbox) -> bool {
    !mailbox.email.user().split('.').any(str::is_empty)
}

impl fmt::Debug for SendEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendEmail")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("cc", &self.cc)
            .finish_non_exhaustive()
    }
}

impl Action for SendEmail {
    fn add_parameter(&mut self, name: &str, value: &str) -> Result<(), ActionError> {
        let invalid = |reason: String| ActionError::InvalidParameter {
            name: name.to_owned(),
            value: value.to_owned(),
            reason: format!("{FUNCTION} - {reason}"),
        };
        let recipients = match name {
            TO_PARAMETER => &mut self.to,
            CC_PARAMETER => &mut self.cc,
            _ => return Err(invalid("unknown parameter name".to_owned())),
        };
        let mailbox: Mailbox = value
            .parse()
            .map_err(|e: AddressError| invalid(format!("not a valid email address: {e}")))?;
        if !strict_local_part(&mailbox) {
            return Err(invalid("not a valid email address: malformed local part".to_owned()));
        }
        recipients.push(mailbox);
        self.parameters.push(Parameter::new(name, value));
        Ok(())
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn execute(&mut self) -> Result<(), ActionError> {
        if self.to.is_empty() && self.cc.is_empty() {
            return Err(ActionError::ExecutionFailed(format!(
                "{FUNCTION} - no recipients"
            )));
        }
        let message = self.message()?;
        self.mailer.send(&message).map_err(|e| {
            ActionError::ExecutionFailed(format!("{FUNCTION} - unable to send the message: {e}"))
        })
    }
}
