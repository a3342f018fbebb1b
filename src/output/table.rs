use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::report::SummaryRow;

pub fn render_summary_table(rows: &[SummaryRow]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "To add", "To remove", "To change"]);

    for row in rows {
        table.add_row(Row::from(vec![
            Cell::new(&row.kind),
            count_cell(row.to_add, Color::Green),
            count_cell(row.to_remove, Color::Red),
            count_cell(row.to_change, Color::Yellow),
        ]));
    }
    table.to_string()
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        Cell::new("0")
    } else {
        Cell::new(count.to_string()).fg(color)
    }
}
