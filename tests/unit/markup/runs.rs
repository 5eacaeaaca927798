use super::*;

fn texts(runs: &[StyledRun]) -> Vec<&str> {
    runs.iter()
        .map(|r| if r.is_line_break { "<br>" } else { r.text.as_str() })
        .collect()
}

#[test]
fn words_and_spaces_are_separate_runs() {
    let runs = tokenize("Hello   big world", false);
    assert_eq!(texts(&runs), vec!["Hello", " ", "big", " ", "world"]);
    assert!(runs.iter().all(|r| !r.bold && !r.italic && !r.underline));
}

#[test]
fn style_flags_inherit_from_ancestors() {
    let runs = tokenize("a <b>b <i>bi <u>biu</u></i></b>", false);
    assert_eq!(texts(&runs), vec!["a", " ", "b", " ", "bi", " ", "biu"]);
    assert_eq!(runs[0].style(), RunStyle::default());
    assert!(runs[2].bold && !runs[2].italic);
    assert!(runs[4].bold && runs[4].italic && !runs[4].underline);
    assert!(runs[6].bold && runs[6].italic && runs[6].underline);
}

#[test]
fn same_style_fragments_merge_into_one_word() {
    let runs = tokenize("<b>Hel</b><b>lo</b>", false);
    assert_eq!(texts(&runs), vec!["Hello"]);
    assert!(runs[0].bold);
}

#[test]
fn style_change_inside_word_splits_run() {
    let runs = tokenize("Hel<b>lo</b>", false);
    assert_eq!(texts(&runs), vec!["Hel", "lo"]);
    assert!(!runs[0].bold);
    assert!(runs[1].bold);
}

#[test]
fn breaks_emit_line_break_runs() {
    let runs = tokenize("one<br>two<br/>three", false);
    assert_eq!(texts(&runs), vec!["one", "<br>", "two", "<br>", "three"]);
    assert!(runs[1].is_line_break);
    assert!(!runs[1].is_whitespace());
}

#[test]
fn whitespace_collapses_across_style_boundaries() {
    let runs = tokenize("Hello <b> World</b>", false);
    assert_eq!(texts(&runs), vec!["Hello", " ", "World"]);
    assert!(runs[2].bold);
}

#[test]
fn uppercase_applies_to_every_styled_run() {
    let runs = tokenize("Hello <b>World</b> &amp; more", true);
    assert_eq!(
        texts(&runs),
        vec!["HELLO", " ", "WORLD", " ", "&", " ", "MORE"]
    );
    assert!(runs[2].bold);
}

#[test]
fn uppercase_covers_entity_decoded_letters() {
    let runs = tokenize("caf&#233; &amp; b&#97;r <i>&#x65;nd</i>", true);
    assert_eq!(
        texts(&runs),
        vec!["CAF\u{c9}", " ", "&", " ", "BAR", " ", "END"]
    );
    assert!(runs[6].italic);
}

#[test]
fn non_breaking_space_stays_in_word() {
    let runs = tokenize("a&nbsp;b c", false);
    assert_eq!(texts(&runs), vec!["a\u{a0}b", " ", "c"]);
}

#[test]
fn bold_tag_marks_only_its_word() {
    let runs = tokenize("Hello <b>World</b>", false);
    assert_eq!(texts(&runs), vec!["Hello", " ", "World"]);
    assert!(!runs[0].bold);
    assert!(runs[2].bold);
}
