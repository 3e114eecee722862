//! Partner matching: compatibility filtering, interest scoring, and
//! candidate selection strategies

pub mod filter;
pub mod matcher;
pub mod score;

pub use filter::{is_compatible, PreferencePolicy};
pub use matcher::{
    BestOfPoolMatcher, FirstAvailableMatcher, InterestDepthMatcher, MatchStrategy, MatchingConfig,
    PartnerMatcher,
};
pub use score::shared_interest_count;
