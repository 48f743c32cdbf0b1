//! Local priority suggestion from task wording.

use db::models::task::Priority;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schedule::contains_word;

static HIGH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(urgent|asap|immediately|critical|emergency|deadline|important)\b",
        r"(?i)\b(ceo|clients?|presentations?|interviews?|exams?)\b",
        r"(?i)\b(today|tonight|tomorrow|this week)\b",
        r"(?i)\bin \d+ (hours?|hrs?|minutes?|mins?)\b",
        r"(?i)\bby \d{1,2}:\d{2}\b",
        r"فوری|ضروری|اہم",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid high priority regex"))
    .collect()
});

static LOW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(next week|eventually|someday|some day|later|maybe|no rush|whenever|optional)\b",
        r"(?i)\b(if possible|nice to have)\b",
        r"کبھی|بعد میں|اگلے ہفتے",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid low priority regex"))
    .collect()
});

/// Urgency markers win over deferral markers; everything else is medium.
pub fn suggest_priority(title: &str, description: Option<&str>) -> Priority {
    let text = match description {
        Some(d) if !d.trim().is_empty() => format!("{} {}", title, d),
        _ => title.to_string(),
    };

    if HIGH_PATTERNS.iter().any(|re| re.is_match(&text)) || contains_word(&text, "آج") {
        Priority::High
    } else if LOW_PATTERNS.iter().any(|re| re.is_match(&text)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_markers_are_high() {
        assert_eq!(suggest_priority("urgent: renew passport", None), Priority::High);
        assert_eq!(suggest_priority("Reply ASAP", None), Priority::High);
        assert_eq!(suggest_priority("pay rent", Some("due today")), Priority::High);
        assert_eq!(suggest_priority("call back in 2 hours", None), Priority::High);
        assert_eq!(suggest_priority("submit form by 10:30", None), Priority::High);
        assert_eq!(suggest_priority("فوری بل جمع کرو", None), Priority::High);
        assert_eq!(suggest_priority("آج دوائی لینا", None), Priority::High);
        assert_eq!(suggest_priority("pay rent", Some("due tomorrow")), Priority::High);
        assert_eq!(suggest_priority("finish report this week", None), Priority::High);
        assert_eq!(suggest_priority("send invoice to client", None), Priority::High);
        assert_eq!(suggest_priority("prepare presentation slides", None), Priority::High);
        assert_eq!(suggest_priority("study for exam", None), Priority::High);
        assert_eq!(suggest_priority("Interview prep", None), Priority::High);
        assert_eq!(suggest_priority("email the CEO", None), Priority::High);
    }

    #[test]
    fn urdu_today_is_a_whole_word() {
        assert_eq!(suggest_priority("آج، بل ادا کرنا", None), Priority::High);
        assert_eq!(suggest_priority("آجکل کی خبریں پڑھنا", None), Priority::Medium);
    }

    #[test]
    fn deferral_markers_are_low() {
        assert_eq!(suggest_priority("clean garage next week", None), Priority::Low);
        assert_eq!(suggest_priority("learn piano someday", None), Priority::Low);
        assert_eq!(suggest_priority("read that book eventually", None), Priority::Low);
        assert_eq!(suggest_priority("کبھی پہاڑوں پر جانا", None), Priority::Low);
        assert_eq!(suggest_priority("کمرہ بعد میں صاف کرنا", None), Priority::Low);
        assert_eq!(suggest_priority("fix the shelf if possible", None), Priority::Low);
        assert_eq!(suggest_priority("dark mode, nice to have", None), Priority::Low);
    }

    #[test]
    fn plain_tasks_are_medium() {
        assert_eq!(suggest_priority("call mom", None), Priority::Medium);
        assert_eq!(suggest_priority("translate the letter", None), Priority::Medium);
        assert_eq!(suggest_priority("امی کو فون کرنا", None), Priority::Medium);
    }

    #[test]
    fn urgency_beats_deferral() {
        assert_eq!(
            suggest_priority("urgent, but maybe later", None),
            Priority::High
        );
    }
}
