//! Description generator
//!
//! A description is a sequence of content blocks laid out by one of several skeletons.
//! Each block renders one sentence from its phrase pool; blocks whose pool has nothing
//! renderable for the request are left out. Keyword sentences are then woven between
//! blocks and the result passes the content filter before it is clamped.

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::core::config::{self, GenerationRequest};
use crate::core::content_filter::ContentFilter;
use crate::core::pools::{self, renderable, Vars};
use crate::core::similarity::{prefix, signature};
use crate::core::text::{capitalize_first, clamp, collapse_whitespace, strip_forbidden_labels};
use crate::core::uniqueness::RunState;

pub const DESCRIPTION_MAX: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    Opener,
    Style,
    Frame,
    Lens,
    Collection,
    Scenario,
    Audience,
    Occasion,
    Gift,
    Tone,
    Disclaimer,
}

/// A named block ordering.
#[derive(Debug)]
pub struct Skeleton {
    pub key: &'static str,
    pub blocks: &'static [Block],
}

use Block::*;

pub const SKELETONS: &[Skeleton] = &[
    Skeleton {
        key: "A",
        blocks: &[Opener, Style, Frame, Lens, Collection, Scenario, Audience, Occasion, Gift, Tone, Disclaimer],
    },
    Skeleton {
        key: "B",
        blocks: &[Opener, Frame, Scenario, Lens, Collection, Style, Audience, Gift, Occasion, Tone, Disclaimer],
    },
    Skeleton {
        key: "C",
        blocks: &[Opener, Lens, Style, Collection, Frame, Audience, Scenario, Occasion, Gift, Tone, Disclaimer],
    },
    Skeleton {
        key: "D",
        blocks: &[Opener, Audience, Frame, Scenario, Collection, Lens, Style, Tone, Gift, Occasion, Disclaimer],
    },
    Skeleton {
        key: "E",
        blocks: &[Opener, Style, Scenario, Frame, Collection, Lens, Audience, Occasion, Tone, Gift, Disclaimer],
    },
    Skeleton {
        key: "F",
        blocks: &[Opener, Collection, Frame, Lens, Scenario, Style, Audience, Gift, Tone, Occasion, Disclaimer],
    },
    Skeleton {
        key: "G",
        blocks: &[Opener, Occasion, Collection, Style, Lens, Frame, Scenario, Audience, Tone, Disclaimer, Gift],
    },
    Skeleton {
        key: "H",
        blocks: &[Opener, Scenario, Lens, Frame, Style, Collection, Tone, Audience, Occasion, Disclaimer, Gift],
    },
];

#[derive(Debug, Clone)]
pub struct TextCandidate {
    pub text: String,
    pub signature: String,
    pub prefix: String,
    pub structure_key: &'static str,
}

pub struct DescriptionGenerator {
    occasion: Option<String>,
    filter: ContentFilter,
}

fn pick<R: Rng>(pool: &[&'static str], rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

impl DescriptionGenerator {
    /// `occasion` is the already resolved occasion text, if any.
    pub fn new(occasion: Option<String>, filter: ContentFilter) -> Self {
        Self {
            occasion: occasion.filter(|o| !o.trim().is_empty()),
            filter,
        }
    }

    pub fn skeleton_for(variant: usize) -> &'static Skeleton {
        &SKELETONS[variant % SKELETONS.len()]
    }

    /// One candidate description for the row at `row_index`, laid out by the skeleton that
    /// `variant` selects.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        state: &mut RunState<'_>,
        variant: usize,
        row_index: usize,
    ) -> TextCandidate {
        let skeleton = Self::skeleton_for(variant);
        let with_occasion = self.occasion.is_some() && state.includes_occasion(row_index);
        let rng = state.rng();

        let (audience_kw, audience_pool) = audience_for(request.audience, rng);
        let vars = Vars {
            brand: request.brand.trim(),
            shape: request.shape.trim(),
            lens: request.lens.trim(),
            collection: request.collection.trim(),
            occasion: if with_occasion { self.occasion.as_deref().unwrap_or_default() } else { "" },
            core: pick(pools::CORE_KEYWORDS, rng),
            kind: pick(pools::KIND_KEYWORDS, rng),
            audience_kw,
        };

        let mut sentences: Vec<String> = Vec::new();
        for block in skeleton.blocks {
            let pool: &[&str] = match block {
                Opener => pools::OPENERS,
                Style => pools::STYLE,
                Frame => pools::FRAME,
                Lens => pools::LENS,
                Collection => pools::COLLECTION,
                Scenario => pools::SCENARIO,
                Audience => audience_pool,
                Occasion => pools::OCCASION,
                Gift => pools::GIFT,
                Tone => tone_pool(request.tone),
                Disclaimer => pools::DISCLAIMER,
            };
            if let Some(sentence) = renderable(pool, &vars).into_iter().choose(rng) {
                sentences.push(sentence);
            }
        }

        let seo = renderable(pools::SEO_PHRASES, &vars);
        for phrase in seo.choose_multiple(rng, request.seo_level.insertions()) {
            let hi = sentences.len().saturating_sub(2).max(1);
            let pos = rng.gen_range(1..=hi).min(sentences.len());
            sentences.insert(pos, phrase.clone());
        }

        let text = self.finish(&sentences);
        TextCandidate {
            signature: signature(&text),
            prefix: prefix(&text),
            structure_key: skeleton.key,
            text,
        }
    }

    fn finish(&self, sentences: &[String]) -> String {
        let joined = sentences
            .iter()
            .map(|s| s.trim().trim_end_matches(['.', ' ']))
            .filter(|s| !s.is_empty())
            .map(|s| format!("{}.", capitalize_first(s)))
            .collect::<Vec<_>>()
            .join(" ");
        let filtered = self.filter.apply(&joined);
        let cleaned = capitalize_first(&collapse_whitespace(&strip_forbidden_labels(&filtered)));
        clamp(&cleaned, DESCRIPTION_MAX)
    }
}

fn audience_for<R: Rng>(audience: config::Audience, rng: &mut R) -> (&'static str, &'static [&'static str]) {
    let female = (pools::FEMALE_KEYWORD, pools::AUDIENCE_FEMALE);
    let male = (pools::MALE_KEYWORD, pools::AUDIENCE_MALE);
    let unisex = (pools::UNISEX_KEYWORD, pools::AUDIENCE_UNISEX);
    match audience {
        config::Audience::Female => female,
        config::Audience::Male => male,
        config::Audience::Unisex => unisex,
        config::Audience::Auto => *[female, male, unisex].choose(rng).unwrap_or(&unisex),
    }
}

fn tone_pool(tone: config::Tone) -> &'static [&'static str] {
    match tone {
        config::Tone::Premium => pools::TONE_PREMIUM,
        config::Tone::Market => pools::TONE_MARKET,
        config::Tone::Social => pools::TONE_SOCIAL,
        config::Tone::Neutral => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{SeoLevel, Tone};
    use crate::core::text::has_forbidden_label;
    use std::collections::HashSet;

    fn request() -> GenerationRequest {
        let mut r = GenerationRequest::new("Ray-Ban");
        r.shape = "авиаторы".into();
        r.lens = "UV400".into();
        r.collection = "Весна–Лето 2026".into();
        r
    }

    #[test]
    fn skeletons_have_distinct_keys_and_start_with_the_opener() {
        let keys: HashSet<&str> = SKELETONS.iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), SKELETONS.len());
        assert!(SKELETONS.iter().all(|s| s.blocks[0] == Block::Opener));
        assert_eq!(DescriptionGenerator::skeleton_for(SKELETONS.len() + 1).key, "B");
    }

    #[test]
    fn candidates_are_bounded_and_clean() {
        let generator = DescriptionGenerator::new(None, ContentFilter::new(true, false));
        let req = request();
        let mut state = RunState::new(21, 6);
        for variant in 0..16 {
            let c = generator.generate(&req, &mut state, variant, variant % 6);
            assert!(!c.text.is_empty());
            assert!(c.text.chars().count() <= DESCRIPTION_MAX);
            assert!(!has_forbidden_label(&c.text));
            assert!(c.text.contains("Ray-Ban"));
            assert!(!c.text.contains('{'));
            assert!(!c.text.contains("100%"));
            assert!(c.text.chars().next().is_some_and(char::is_uppercase));
        }
    }

    #[test]
    fn missing_attributes_drop_their_blocks() {
        let generator = DescriptionGenerator::new(None, ContentFilter::new(true, false));
        let req = GenerationRequest::new("Dior");
        let mut state = RunState::new(4, 6);
        for variant in 0..8 {
            let c = generator.generate(&req, &mut state, variant, 0);
            assert!(!c.text.contains("коллекции"));
            assert!(!c.text.contains("линейки"));
            assert!(!c.text.contains("  "));
        }
    }

    #[test]
    fn low_seo_adds_fewer_keyword_sentences() {
        let generator = DescriptionGenerator::new(None, ContentFilter::new(false, false));
        let mut low = request();
        low.seo_level = SeoLevel::Low;
        low.tone = Tone::Neutral;
        let high = SeoLevel::High;
        let mut state = RunState::new(8, 6);
        let a = generator.generate(&low, &mut state, 0, 0);
        let mut high_req = low.clone();
        high_req.seo_level = high;
        let mut state = RunState::new(8, 6);
        let b = generator.generate(&high_req, &mut state, 0, 0);
        let count = |t: &str| t.matches(". ").count();
        assert!(count(&a.text) < count(&b.text));
    }

    #[test]
    fn neutral_tone_has_no_tone_block() {
        let generator = DescriptionGenerator::new(None, ContentFilter::new(false, false));
        let mut req = request();
        req.tone = Tone::Neutral;
        let mut state = RunState::new(2, 6);
        for variant in 0..8 {
            let c = generator.generate(&req, &mut state, variant, 0);
            for phrase in pools::TONE_PREMIUM.iter().chain(pools::TONE_SOCIAL).chain(pools::TONE_MARKET) {
                assert!(!c.text.contains(phrase));
            }
        }
    }

    #[test]
    fn strict_mode_removes_absolute_claims_after_the_opener() {
        let generator = DescriptionGenerator::new(None, ContentFilter::new(true, true));
        let req = request();
        let mut state = RunState::new(13, 6);
        for variant in 0..16 {
            let c = generator.generate(&req, &mut state, variant, 0);
            let rest: Vec<&str> = c.text.splitn(2, ". ").collect();
            if let Some(tail) = rest.get(1) {
                assert!(!tail.contains("Всегда"), "absolute claim kept in {}", c.text);
                assert!(!tail.contains("самый"), "absolute claim kept in {}", c.text);
            }
        }
    }
}
