use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::{BrandInTitle, GenerationRequest};
use crate::core::pools::PRODUCT_NOUNS;
use crate::core::text::{capitalize_first, clamp, collapse_whitespace, normalize_plain};
use crate::core::uniqueness::RunState;

pub const TITLE_MAX: usize = 60;

/// Upper bound on reassembly attempts when a title collides with an earlier one.
pub const TITLE_ATTEMPTS: usize = 20;

const PREFERRED_NOUN_CHANCE: f64 = 0.6;
const SHAPE_CHANCE: f64 = 0.55;
const LENS_CHANCE: f64 = 0.75;
const BRAND_CHANCE: f64 = 0.5;
const SHORT_NOUN: &str = PRODUCT_NOUNS[1];
// every few collisions the optional parts are drawn again instead of only reordered
const REDRAW_EVERY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Shape,
    Brand,
    Lens,
}

#[derive(Debug, Clone)]
pub struct TitleOutcome {
    pub text: String,
    pub attempts: usize,
    pub unique: bool,
}

pub struct TitleGenerator {
    brand_local: String,
    slogans: Vec<String>,
}

impl TitleGenerator {
    pub fn new(brand_local: &str, slogans: &[String]) -> Self {
        Self {
            brand_local: brand_local.trim().to_string(),
            slogans: slogans.to_vec(),
        }
    }

    fn wants_brand<R: Rng>(&self, policy: BrandInTitle, rng: &mut R) -> bool {
        if self.brand_local.is_empty() {
            return false;
        }
        match policy {
            BrandInTitle::Always => true,
            BrandInTitle::Never => false,
            BrandInTitle::Balanced => rng.gen_bool(BRAND_CHANCE),
        }
    }

    /// Builds a title of at most [`TITLE_MAX`] characters that differs from every title
    /// accepted earlier in the run, or the last attempt when the budget runs out.
    pub fn generate(&self, request: &GenerationRequest, state: &mut RunState<'_>) -> TitleOutcome {
        let slogan = state.pick_slogan(&self.slogans);
        let put_brand = self.wants_brand(request.brand_in_title, state.rng());
        let shape = request.shape.trim();
        let lens = request.lens.trim();

        let mut noun = PRODUCT_NOUNS[0];
        let mut optional: Vec<PartKind> = Vec::new();
        let mut title = String::new();

        for attempt in 0..TITLE_ATTEMPTS {
            let rng = state.rng();
            if attempt % REDRAW_EVERY == 0 {
                noun = if rng.gen_bool(PREFERRED_NOUN_CHANCE) {
                    PRODUCT_NOUNS[0]
                } else {
                    PRODUCT_NOUNS[1]
                };
                optional.clear();
                if !shape.is_empty() && rng.gen_bool(SHAPE_CHANCE) {
                    optional.push(PartKind::Shape);
                }
                if put_brand {
                    optional.push(PartKind::Brand);
                }
                if !lens.is_empty() && rng.gen_bool(LENS_CHANCE) {
                    optional.push(PartKind::Lens);
                }
            }
            if attempt > 0 {
                optional.shuffle(rng);
            }

            title = self.assemble(&slogan, noun, &optional, shape, lens, request.brand_in_title);
            let signature = normalize_plain(&title);
            if state.used_title_signatures.insert(signature) {
                return TitleOutcome { text: title, attempts: attempt + 1, unique: true };
            }
        }

        log::warn!("Title budget exhausted, reusing a duplicate: {}", title);
        TitleOutcome { text: title, attempts: TITLE_ATTEMPTS, unique: false }
    }

    fn assemble(
        &self,
        slogan: &str,
        noun: &str,
        optional: &[PartKind],
        shape: &str,
        lens: &str,
        policy: BrandInTitle,
    ) -> String {
        let mut kinds: Vec<PartKind> = optional.to_vec();
        let mut slogan = slogan;
        let mut noun = noun;
        loop {
            let mut parts: Vec<&str> = vec![slogan, noun];
            parts.extend(kinds.iter().map(|k| match k {
                PartKind::Shape => shape,
                PartKind::Brand => self.brand_local.as_str(),
                PartKind::Lens => lens,
            }));
            let text = capitalize_first(&collapse_whitespace(&parts.join(" ")));
            if text.chars().count() <= TITLE_MAX {
                return text;
            }
            // drop the last part that may go; a brand the policy requires stays
            let droppable = kinds
                .iter()
                .rposition(|k| !(*k == PartKind::Brand && policy == BrandInTitle::Always));
            if let Some(idx) = droppable {
                kinds.remove(idx);
                continue;
            }
            // only the required brand is left: shorten the rest before cutting into it
            if noun != SHORT_NOUN {
                noun = SHORT_NOUN;
                continue;
            }
            if let Some(shorter) = self.shortest_slogan().filter(|s| s.chars().count() < slogan.chars().count()) {
                slogan = shorter;
                continue;
            }
            if !slogan.is_empty() {
                slogan = "";
                continue;
            }
            return clamp(&text, TITLE_MAX);
        }
    }

    fn shortest_slogan(&self) -> Option<&str> {
        self.slogans
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .min_by_key(|s| s.chars().count())
    }
}
