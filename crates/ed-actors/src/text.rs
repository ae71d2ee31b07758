//! Conversation text capability.

/// Produces flavor dialogue for encounters.
///
/// Encounters never depend on what the generator returns: the line is stored
/// in the participants' `chat` and written to the movement file, nothing
/// more.  A run without a language model plugs in [`NoopTextGenerator`].
///
/// # Thread safety
///
/// The generator is owned by the simulation and may be shared with output
/// threads, so implementations must be `Send + Sync`.
pub trait TextGenerator: Send + Sync + 'static {
    /// One line of dialogue for `prompt`.  An empty string means "say
    /// nothing"; the encounter still happens.
    fn generate(&self, prompt: &str) -> String;

    /// Importance score for `prompt`.  Default: 0.
    fn score(&self, _prompt: &str) -> f64 {
        0.0
    }
}

/// A [`TextGenerator`] that never says anything.
pub struct NoopTextGenerator;

impl TextGenerator for NoopTextGenerator {
    fn generate(&self, _prompt: &str) -> String {
        String::new()
    }
}
