//! Single-slot message handoff from the interrupt handlers to the command task.
//!
//! The command decoder posts validated commands and raw patch words; the telemetry transmitter
//! posts [`Mail::TmReady`] when a transmission completes. The task takes them with
//! [`Mailbox::take`], which follows the `nb` convention and can be wrapped in `nb::block!`.
//!
//! The slot is never overwritten: posting while it still holds an unconsumed message loses the
//! new message and reports the overflow to the caller.

use core::convert::Infallible;

use crate::command::CommandWord;

/// One message for the command task.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Mail {
    /// A command word that passed parity and classification.
    Command(CommandWord),
    /// A raw memory patch payload word. Not validated as a command.
    PatchWord(u16),
    /// The telemetry transmitter finished the armed transmission.
    TmReady,
}

/// Returned by [`Mailbox::post`] when the slot was still occupied.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct MailboxFull(pub Mail);

/// The single-slot mailbox.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Mailbox {
    slot: Option<Mail>,
}

impl Mailbox {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Posts `mail` if the slot is empty.
    ///
    /// # Returns
    /// - `Ok(())` if the message was stored
    /// - `Err(MailboxFull(mail))` if the slot already held a message; `mail` is handed back and
    ///   the stored message is kept
    pub fn post(&mut self, mail: Mail) -> Result<(), MailboxFull> {
        if self.slot.is_some() {
            return Err(MailboxFull(mail));
        }
        self.slot = Some(mail);
        Ok(())
    }

    /// Takes the pending message, or `WouldBlock` if there is none.
    pub fn take(&mut self) -> nb::Result<Mail, Infallible> {
        self.slot.take().ok_or(nb::Error::WouldBlock)
    }

    /// Whether a message is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_take() {
        let mut mailbox = Mailbox::new();
        assert_eq!(mailbox.take(), Err(nb::Error::WouldBlock));
        assert_eq!(mailbox.post(Mail::TmReady), Ok(()));
        assert!(mailbox.is_pending());
        assert_eq!(mailbox.take(), Ok(Mail::TmReady));
        assert!(!mailbox.is_pending());
    }

    #[test]
    fn test_full_slot_keeps_first_message() {
        let mut mailbox = Mailbox::new();
        let first = Mail::Command(CommandWord::new(0x01, 0x01));
        assert_eq!(mailbox.post(first), Ok(()));
        assert_eq!(
            mailbox.post(Mail::PatchWord(0xffff)),
            Err(MailboxFull(Mail::PatchWord(0xffff)))
        );
        assert_eq!(mailbox.take(), Ok(first));
    }

    #[test]
    fn test_patch_word_does_not_alias_tm_ready() {
        let mut mailbox = Mailbox::new();
        assert_eq!(mailbox.post(Mail::PatchWord(0xffff)), Ok(()));
        assert_ne!(mailbox.take(), Ok(Mail::TmReady));
    }

    #[test]
    fn test_block_on_pending_mail() {
        let mut mailbox = Mailbox::new();
        let _ = mailbox.post(Mail::TmReady);
        assert_eq!(nb::block!(mailbox.take()), Ok(Mail::TmReady));
    }
}
