//! Human-readable image dump.
//!
//! Diagnostic output only — nothing here is part of the compiled contract.

use std::fmt::Write;

use super::{Image, StateTable};

/// Render an overview of an image: header fields, section layout, and both
/// state tables.
pub fn dump(image: &Image) -> String {
    let mut out = String::new();
    let h = image.header();

    let v = h.format_version;
    let _ = writeln!(
        out,
        "image: {} bytes, format {}.{}.{}.{}, {} categories",
        h.length, v[0], v[1], v[2], v[3], h.cat_count
    );

    let _ = writeln!(out, "sections:");
    for (name, offset, len) in h.sections() {
        let _ = writeln!(out, "  {name:<14} offset {offset:>6}  len {len:>6}");
    }

    let _ = writeln!(out, "forward table:");
    dump_table(&mut out, &image.forward_table());
    let _ = writeln!(out, "safe reverse table:");
    dump_table(&mut out, &image.safe_reverse_table());

    let _ = writeln!(out, "statuses: {} entries", image.status_count());
    let _ = writeln!(out, "rules: {:?}", image.rule_source());

    out
}

fn dump_table(out: &mut String, table: &StateTable<'_>) {
    let _ = writeln!(
        out,
        "  {} states x {} categories",
        table.num_states(),
        table.num_categories()
    );

    for (state, row) in table.rows().enumerate() {
        let _ = write!(out, "  {state:>4}:");
        if row.accepting() != 0 {
            let _ = write!(out, " accept(rule {}, tag {})", row.accepting(), row.tag_idx());
        }
        for next in row.transitions() {
            let _ = write!(out, " {next:>3}");
        }
        let _ = writeln!(out);
    }
}
