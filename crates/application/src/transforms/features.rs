use ferrous_collector_domain::{FeatureVector, NormalizedMessage};
use rustc_hash::{FxHashMap, FxHashSet};

use super::labels;
use super::stage::{StageOutcome, TransformStage};

/// Lexical features of the query name for offline classifiers.
pub(crate) struct FeaturesStage {
    common_qtypes: FxHashSet<String>,
}

impl FeaturesStage {
    pub(crate) fn new(common_qtypes: &[String]) -> Self {
        Self {
            common_qtypes: common_qtypes
                .iter()
                .map(|qtype| qtype.to_ascii_uppercase())
                .collect(),
        }
    }
}

impl TransformStage for FeaturesStage {
    fn name(&self) -> &'static str {
        "machine_learning"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        msg.features = Some(FeatureVector::default());
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        let mut features = if labels::is_known(&msg.dns.qname) {
            extract(&msg.dns.qname)
        } else {
            FeatureVector::default()
        };
        features.size = msg.dns.length;
        features.uncommon_qtypes =
            labels::is_known(&msg.dns.qtype) && !self.common_qtypes.contains(&msg.dns.qtype);

        msg.features = Some(features);
        StageOutcome::Continue
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn extract(qname: &str) -> FeatureVector {
    let mut fv = FeatureVector {
        length: qname.len(),
        labels: labels::split(qname).len(),
        ..Default::default()
    };

    let mut runs = Runs::default();
    for c in qname.chars() {
        if c.is_ascii_digit() {
            fv.digits += 1;
        } else if c.is_ascii_lowercase() {
            fv.lowers += 1;
        } else if c.is_ascii_uppercase() {
            fv.uppers += 1;
        } else if c.is_ascii_punctuation() {
            fv.specials += 1;
        } else {
            fv.others += 1;
        }
        runs.push(c);
    }

    if fv.length > 0 {
        let total = fv.length as f64;
        fv.ratio_digits = fv.digits as f64 / total;
        fv.ratio_letters = (fv.lowers + fv.uppers) as f64 / total;
        fv.ratio_specials = fv.specials as f64 / total;
        fv.ratio_others = fv.others as f64 / total;
    }

    fv.entropy = shannon_entropy(qname);
    fv.consecutive_chars = runs.chars.best;
    fv.consecutive_vowels = runs.vowels.best;
    fv.consecutive_digits = runs.digits.best;
    fv.consecutive_consonants = runs.consonants.best;
    fv
}

#[derive(Default)]
struct Run {
    current: usize,
    best: usize,
}

impl Run {
    fn step(&mut self, hit: bool) {
        if hit {
            self.current += 1;
            self.best = self.best.max(self.current);
        } else {
            self.current = 0;
        }
    }
}

#[derive(Default)]
struct Runs {
    chars: Run,
    vowels: Run,
    digits: Run,
    consonants: Run,
}

impl Runs {
    fn push(&mut self, c: char) {
        let letter = c.is_ascii_alphabetic();
        self.chars.step(letter);
        self.vowels.step(letter && is_vowel(c));
        self.consonants.step(letter && !is_vowel(c));
        self.digits.step(c.is_ascii_digit());
    }
}

fn shannon_entropy(text: &str) -> f64 {
    let mut freq: FxHashMap<char, usize> = FxHashMap::default();
    let mut total = 0usize;
    for c in text.chars() {
        *freq.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    freq.values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_classes() {
        let fv = extract("Ab3-x.com");

        assert_eq!(fv.length, 9);
        assert_eq!(fv.labels, 2);
        assert_eq!(fv.digits, 1);
        assert_eq!(fv.uppers, 1);
        assert_eq!(fv.lowers, 5);
        assert_eq!(fv.specials, 2);
        assert_eq!(fv.others, 0);
        assert!((fv.ratio_letters - 6.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_runs() {
        let fv = extract("xkcdq1234aeiou.com");

        assert_eq!(fv.consecutive_digits, 4);
        assert_eq!(fv.consecutive_vowels, 5);
        assert_eq!(fv.consecutive_consonants, 5);
        assert_eq!(fv.consecutive_chars, 5);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("abab") - 1.0).abs() < 1e-9);
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn test_uncommon_qtype_flag() {
        let mut stage = FeaturesStage::new(&["A".to_string()]);
        let mut msg = NormalizedMessage::default();
        msg.dns.qname = "example.com".to_string();
        msg.dns.qtype = "TXT".to_string();

        stage.apply(&mut msg);
        let fv = msg.features.unwrap();
        assert!(fv.uncommon_qtypes);
        assert_eq!(fv.labels, 2);
    }
}
