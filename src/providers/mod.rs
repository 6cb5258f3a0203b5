//! Response providers and text classifiers.

pub mod echo;
pub mod gemini;
pub mod huggingface;
pub mod lexicon;
pub mod traits;

pub use echo::EchoProvider;
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceClassifier;
pub use lexicon::LexiconClassifier;
pub use traits::{Classifier, ResponseProvider};

use crate::config::{ClassifierConfig, ClassifierKind, ProviderConfig, ProviderKind};
use crate::error::Result;

/// Build the configured response provider.
///
/// # Errors
///
/// Returns an error if the provider cannot be constructed (for example a
/// missing API key).
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn ResponseProvider>> {
    match config.kind {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
        ProviderKind::Echo => Ok(Box::new(EchoProvider::new())),
    }
}

/// Build the configured classifier.
///
/// # Errors
///
/// Returns an error if the classifier cannot be constructed.
pub fn build_classifier(config: &ClassifierConfig) -> Result<Box<dyn Classifier>> {
    match config.kind {
        ClassifierKind::HuggingFace => Ok(Box::new(HuggingFaceClassifier::new(config)?)),
        ClassifierKind::Lexicon => Ok(Box::new(LexiconClassifier::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_offline_collaborators() {
        let provider = ProviderConfig {
            kind: ProviderKind::Echo,
            ..ProviderConfig::default()
        };
        assert_eq!(build_provider(&provider).unwrap().name(), "echo");

        let classifier = ClassifierConfig::default();
        assert_eq!(build_classifier(&classifier).unwrap().name(), "lexicon");
    }
}
