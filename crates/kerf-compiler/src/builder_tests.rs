use indoc::indoc;

use kerf_data::{HEADER_SIZE, Image, align8};

use crate::builder::RuleBuilder;
use crate::scanner::strip_rules;
use crate::sets::RESERVED_CATEGORIES;
use crate::tables::TableBuilder;
use crate::{Error, IndexPair, compile};

const WORDISH_RULES: &str = indoc! {"
    # word-ish boundaries
    $Letter = [a-z A-Z];
    $Digit  = [0-9];
    $Letter+ {200};
    $Digit+ {100};
    [\\u0020];
"};

#[test]
fn compiles_to_valid_image() {
    let image = compile(WORDISH_RULES).unwrap();
    assert!(image.header().cat_count >= RESERVED_CATEGORIES as u32);
    assert_eq!(image.header().length as usize, image.len());
}

#[test]
fn deterministic_output() {
    let first = compile(WORDISH_RULES).unwrap();
    let second = compile(WORDISH_RULES).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn size_accounting() {
    let image = compile(WORDISH_RULES).unwrap();
    let h = image.header();

    let mut expected_offset = HEADER_SIZE as u32;
    let mut total = HEADER_SIZE;
    let padded = [
        (h.f_table, h.f_table_len as usize),
        (h.r_table, h.r_table_len as usize),
        (h.trie, align8(h.trie_len as usize)),
        (h.status_table, h.status_table_len as usize),
        (h.rule_source, align8(h.rule_source_len as usize + 2)),
    ];
    for (offset, footprint) in padded {
        assert_eq!(offset, expected_offset, "sections are contiguous");
        assert!(offset.is_multiple_of(8), "sections are 8-byte aligned");
        expected_offset += footprint as u32;
        total += footprint;
    }
    assert_eq!(h.length as usize, total);
}

#[test]
fn trie_reserves_low_categories() {
    let image = compile(WORDISH_RULES).unwrap();
    let trie = image.trie();

    // live categories start at 3
    assert!(trie.category('a' as u32) >= RESERVED_CATEGORIES);
    assert!(trie.category('5' as u32) >= RESERVED_CATEGORIES);
    // unmentioned code points sit in category 0; 1 and 2 stay sentinels
    assert_eq!(trie.category('!' as u32), 0);
    assert_eq!(trie.category(0x4E00), 0);
}

#[test]
fn accepting_state_carries_status() {
    let image = compile("[a-c]+ {7};").unwrap();
    let table = image.forward_table();

    let accepting: Vec<_> = table.rows().filter(|r| r.accepting() != 0).collect();
    assert_eq!(accepting.len(), 1);
    let statuses: Vec<i32> = image.rule_statuses(accepting[0].tag_idx()).collect();
    assert_eq!(statuses, vec![7]);
}

#[test]
fn rule_text_roundtrip() {
    let source = "  $x = [ab] ;  # def\n  $x + {3} ;\n";
    let image = compile(source).unwrap();
    assert_eq!(image.rule_source(), strip_rules(source));
    assert_eq!(image.rule_source(), "$x=[ab];$x+{3};");
}

#[test]
fn comment_heavy_input_still_compiles() {
    let source = "\n  # nothing but a minimal rule\n\n[a];\n  # done\n";
    let image = compile(source).unwrap();
    assert_eq!(image.header().cat_count, 4);
    assert_eq!(image.rule_source(), "[a];");
    assert_eq!(image.header().rule_source_len, 4 * 2);
}

#[test]
fn malformed_rules_yield_no_image() {
    let err = compile("[a] [b ;").unwrap_err();
    let Error::Parse(parse_err) = err else {
        panic!("expected a parse error, got {err}");
    };
    assert!(parse_err.offset() > 0);
}

#[test]
fn identical_columns_merge() {
    // [a] and [b] are distinguished by no rule: their columns coincide once
    // the duplicate states collapse, so one category disappears.
    let image = compile("[a][x]|[b][x];").unwrap();
    // naive: 3 reserved + a + b + x = 6
    assert_eq!(image.header().cat_count, 5);

    // stop, start, after-a-or-b, accept
    let table = image.forward_table();
    assert_eq!(table.num_states(), 4);
    // forward section: 16-byte local header + 4 rows of 4 + 2*5 bytes
    assert_eq!(image.header().f_table_len, align8(16 + 4 * 14) as u32);
}

#[test]
fn minimization_reaches_fixed_point() {
    let mut builder = RuleBuilder::parse(WORDISH_RULES).unwrap();
    builder.sets.build_ranges().unwrap();
    let mut table = TableBuilder::build_forward(
        &builder.parsed.arena,
        builder.parsed.forward,
        &builder.sets,
        &builder.parsed.rule_statuses,
        &mut builder.statuses,
    )
    .unwrap();

    let raw_categories = table.num_categories();
    let raw_states = table.num_states();

    RuleBuilder::optimize_tables(&mut builder.sets, &mut table);
    let categories = table.num_categories();
    let states = table.num_states();
    assert!(categories <= raw_categories);
    assert!(states <= raw_states);

    // no duplicate category pair survives
    let mut pair = IndexPair {
        first: RESERVED_CATEGORIES,
        second: 0,
    };
    assert!(!table.find_duplicate_category_from(&mut pair));
    // no duplicate state survives
    assert_eq!(table.remove_duplicate_states(), 0);

    // re-running the whole loop is a no-op
    RuleBuilder::optimize_tables(&mut builder.sets, &mut table);
    assert_eq!(table.num_categories(), categories);
    assert_eq!(table.num_states(), states);
}

#[test]
fn safe_reverse_table_present() {
    let image = compile(WORDISH_RULES).unwrap();
    let safe = image.safe_reverse_table();
    assert!(safe.num_states() >= 2);
    assert!(safe.num_states() as u32 <= image.header().cat_count + 2);
    assert_eq!(safe.num_categories(), image.header().cat_count);
    assert!(safe.row(0).transitions().all(|next| next == 0));
}

#[test]
fn image_survives_reload() {
    let image = compile(WORDISH_RULES).unwrap();
    let reloaded = Image::from_vec(image.as_bytes().to_vec()).unwrap();
    assert_eq!(reloaded.header(), image.header());
    assert_eq!(reloaded.rule_source(), image.rule_source());
}

#[test]
fn error_display_names_the_limit() {
    assert!(
        Error::TooManyCategories(70000)
            .to_string()
            .contains("70000")
    );
    assert!(Error::TooManyStates(70001).to_string().contains("70001"));
}
