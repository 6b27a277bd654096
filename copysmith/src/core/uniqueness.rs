//! Uniqueness controller
//!
//! Drives description generation for one row at a time against everything accepted earlier
//! in the run: repeated openings, repeated signatures and repeated skeletons are rejected
//! outright, and a candidate is accepted once its highest Jaccard similarity to the accepted
//! descriptions is within the threshold. When the attempt budget runs out the least similar
//! candidate seen is kept instead.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::core::batch_lock::{pick_slogan, BatchLock};
use crate::core::config::GenerationRequest;
use crate::core::content_filter::ContentFilter;
use crate::core::description::{DescriptionGenerator, TextCandidate, SKELETONS};
use crate::core::pools::Lexicon;
use crate::core::similarity::{jaccard_sets, tokenize, uniqueness_threshold, TokenSet};
use crate::core::title::TitleGenerator;

/// Share of rows that mention the occasion, rounded up.
const OCCASION_SHARE: (usize, usize) = (2, 5);

const SEED_MIX: u64 = 2_654_435_761;

/// Seed for one output file.
///
/// Mixes fresh entropy with a digest of `discriminator` (usually the template name) and the
/// file index, so no two runs or files share a sequence. A pinned seed takes the place of
/// the entropy and makes the run reproducible.
pub fn seed_for(discriminator: &str, file_index: usize, pinned: Option<u64>) -> u64 {
    let digest = Sha256::digest(discriminator.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let base = pinned.unwrap_or_else(|| rand::thread_rng().gen());
    base ^ u64::from_le_bytes(bytes) ^ (file_index as u64).wrapping_mul(SEED_MIX)
}

/// Per-run memory shared by the title and description generators.
///
/// Created once per output file and dropped at its end. The only state that outlives a run
/// is the optional [`BatchLock`] it borrows.
pub struct RunState<'a> {
    rng: StdRng,
    pub(crate) used_title_signatures: HashSet<String>,
    used_prefixes: HashSet<String>,
    used_signatures: HashSet<String>,
    used_structures: HashSet<&'static str>,
    accepted: Vec<String>,
    accepted_tokens: Vec<TokenSet>,
    rows_requested: usize,
    slogan_deck: Vec<String>,
    lock: Option<&'a mut BatchLock>,
    rotation: usize,
    occasion_rows: HashSet<usize>,
}

impl<'a> RunState<'a> {
    pub fn new(seed: u64, rows_requested: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rotation = rng.gen_range(0..SKELETONS.len());
        let rows = rows_requested.max(1);
        let (num, den) = OCCASION_SHARE;
        let occasion_count = ((rows * num + den - 1) / den).min(rows);
        let occasion_rows = rand::seq::index::sample(&mut rng, rows, occasion_count).into_iter().collect();
        Self {
            rng,
            used_title_signatures: HashSet::new(),
            used_prefixes: HashSet::new(),
            used_signatures: HashSet::new(),
            used_structures: HashSet::new(),
            accepted: Vec::new(),
            accepted_tokens: Vec::new(),
            rows_requested: rows,
            slogan_deck: Vec::new(),
            lock: None,
            rotation,
            occasion_rows,
        }
    }

    pub fn with_lock(mut self, lock: &'a mut BatchLock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    pub fn accepted_texts(&self) -> &[String] {
        &self.accepted
    }

    pub fn distinct_structures(&self) -> usize {
        self.used_structures.len()
    }

    pub fn includes_occasion(&self, row_index: usize) -> bool {
        self.occasion_rows.contains(&(row_index % self.rows_requested))
    }

    pub fn pick_slogan(&mut self, pool: &[String]) -> String {
        pick_slogan(pool, &mut self.slogan_deck, &mut self.rng, self.lock.as_deref_mut())
    }

    fn max_similarity(&self, tokens: &TokenSet) -> f64 {
        self.accepted_tokens
            .iter()
            .map(|t| jaccard_sets(tokens, t))
            .fold(0.0, f64::max)
    }

    /// Skeletons stay unique while there are fewer accepted rows than skeletons to go round.
    fn structure_taken(&self, key: &str) -> bool {
        let distinct_goal = self.rows_requested.min(SKELETONS.len());
        self.used_structures.len() < distinct_goal && self.used_structures.contains(key)
    }

    fn accept(&mut self, candidate: &TextCandidate, tokens: TokenSet) {
        self.used_prefixes.insert(candidate.prefix.clone());
        self.used_signatures.insert(candidate.signature.clone());
        self.used_structures.insert(candidate.structure_key);
        self.accepted.push(candidate.text.clone());
        self.accepted_tokens.push(tokens);
    }
}

#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub title: String,
    pub description: String,
    pub structure_key: &'static str,
    /// Highest similarity to the descriptions accepted before this one
    pub max_similarity: f64,
    pub within_threshold: bool,
    pub attempts: usize,
}

/// Generators and limits for one fill operation.
pub struct Copywriter<'r> {
    request: &'r GenerationRequest,
    titles: TitleGenerator,
    descriptions: DescriptionGenerator,
    threshold: f64,
}

impl<'r> Copywriter<'r> {
    /// `occasion` is the resolved occasion text, see [`crate::core::occasion::resolve`].
    pub fn new(request: &'r GenerationRequest, lexicon: &Lexicon, occasion: Option<String>) -> Self {
        let brand_local = request
            .brand_local
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| lexicon.brands.localize(&request.brand).map(str::to_string))
            .unwrap_or_else(|| {
                log::warn!("No localized form for brand {}, titles use it as is", request.brand);
                request.brand.trim().to_string()
            });

        Self {
            request,
            titles: TitleGenerator::new(&brand_local, &lexicon.slogans),
            descriptions: DescriptionGenerator::new(
                occasion,
                ContentFilter::new(request.wb_safe_mode, request.wb_strict),
            ),
            threshold: uniqueness_threshold(request.uniqueness_strength),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Produces the title and description for one row.
    pub fn fill_row(&self, state: &mut RunState<'_>, row_index: usize) -> RowOutcome {
        let variant = state.rotation() + row_index;
        let mut best: Option<(TextCandidate, TokenSet, f64)> = None;
        let mut accepted: Option<(TextCandidate, TokenSet, f64)> = None;
        let mut attempts = 0;

        while attempts < self.request.max_attempts {
            attempts += 1;
            let candidate = self.descriptions.generate(self.request, state, variant, row_index);
            if state.used_prefixes.contains(&candidate.prefix)
                || state.used_signatures.contains(&candidate.signature)
                || state.structure_taken(candidate.structure_key)
            {
                continue;
            }
            let tokens = tokenize(&candidate.text);
            let similarity = state.max_similarity(&tokens);
            if similarity <= self.threshold {
                accepted = Some((candidate, tokens, similarity));
                break;
            }
            if best.as_ref().map_or(true, |(_, _, s)| similarity < *s) {
                best = Some((candidate, tokens, similarity));
            }
        }

        let within_threshold = accepted.is_some();
        let (candidate, tokens, similarity) = match accepted.or(best) {
            Some(found) => found,
            None => {
                // every attempt repeated an opening or signature
                let candidate = self.descriptions.generate(self.request, state, variant, row_index);
                let tokens = tokenize(&candidate.text);
                let similarity = state.max_similarity(&tokens);
                (candidate, tokens, similarity)
            }
        };
        if !within_threshold {
            log::warn!(
                "Row {}: no candidate within similarity {:.2} after {} attempts, keeping {:.2}",
                row_index,
                self.threshold,
                attempts,
                similarity
            );
        }
        state.accept(&candidate, tokens);

        let title = self.titles.generate(self.request, state);
        log::debug!(
            "Row {}: skeleton {}, similarity {:.2}, {} attempts",
            row_index,
            candidate.structure_key,
            similarity,
            attempts
        );
        RowOutcome {
            title: title.text,
            description: candidate.text,
            structure_key: candidate.structure_key,
            max_similarity: similarity,
            within_threshold,
            attempts,
        }
    }
}
