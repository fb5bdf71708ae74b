//! Result table: one row per feature of the latest search, sortable by any column.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::feature::FeatureRecord;

/// Text displayed instead of the table when the search matched nothing.
pub const NO_MATCHES_TEXT: &str = "No matches found";

const ASCENDING_MARK: &str = " ▲";
const DESCENDING_MARK: &str = " ▼";

/// Column of the result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Header text.
    pub label: String,
    /// Attribute key of the displayed value.
    pub key: String,
}

impl Column {
    /// Creates a new column.
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }
}

/// Sort state of a table: at most one sorted column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    column: Option<usize>,
    ascending: bool,
}

impl SortState {
    /// Sorted column, if any.
    pub fn column(&self) -> Option<usize> {
        self.column
    }

    /// Direction of the sorted column.
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// State after a click on the header of `column`: a click on the sorted column flips the
    /// direction, a click on any other column sorts it ascending.
    fn clicked(self, column: usize) -> Self {
        let ascending = if self.column == Some(column) {
            !self.ascending
        } else {
            true
        };

        Self {
            column: Some(column),
            ascending,
        }
    }
}

/// Rendered table of a non-empty result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
    records: Vec<FeatureRecord>,
    cells: Vec<Vec<String>>,
    // Displayed order: indices into `records`.
    order: Vec<usize>,
    sort: SortState,
}

impl ResultTable {
    fn new(records: Vec<FeatureRecord>, columns: &[Column]) -> Self {
        let cells = records
            .iter()
            .map(|r| columns.iter().map(|c| r.text(&c.key)).collect())
            .collect();

        Self {
            columns: columns.to_vec(),
            order: (0..records.len()).collect(),
            records,
            cells,
            sort: SortState::default(),
        }
    }

    /// Columns of the table.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Header texts, with the direction mark on the sorted column.
    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| match self.sort.column {
                Some(sorted) if sorted == i => {
                    let mark = if self.sort.ascending {
                        ASCENDING_MARK
                    } else {
                        DESCENDING_MARK
                    };
                    format!("{}{mark}", column.label)
                }
                _ => column.label.clone(),
            })
            .collect()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    /// Cell texts of a displayed row.
    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.order.get(row).map(|&i| self.cells[i].as_slice())
    }

    /// Cell texts of all rows in displayed order.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.order.iter().map(|&i| self.cells[i].as_slice())
    }

    /// Record displayed in the row.
    pub fn row_record(&self, row: usize) -> Option<&FeatureRecord> {
        self.order.get(row).map(|&i| &self.records[i])
    }

    /// Current sort state.
    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Handles a click on the header of the column.
    ///
    /// Rows are compared by the trimmed, lower-cased cell text. The sort is stable and is applied
    /// to the currently displayed order, so rows with equal keys keep their relative positions.
    pub fn sort_by(&mut self, column: usize) -> Result<SortState, ValidationError> {
        if column >= self.columns.len() {
            return Err(ValidationError::UnknownColumn(column));
        }

        let sort = self.sort.clicked(column);
        let keys: Vec<String> = self
            .cells
            .iter()
            .map(|row| row[column].trim().to_lowercase())
            .collect();
        self.order.sort_by(|&a, &b| {
            let ordering = keys[a].cmp(&keys[b]);
            if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self.sort = sort;

        Ok(sort)
    }

    fn write_html(&self, out: &mut String) -> std::fmt::Result {
        out.push_str("<table border=\"1\"><thead><tr>");
        for (i, header) in self.headers().iter().enumerate() {
            write!(
                out,
                "<th data-column=\"{i}\" style=\"cursor: pointer\">{}</th>",
                escape_html(header)
            )?;
        }
        out.push_str("</tr></thead><tbody>");
        for (i, row) in self.rows().enumerate() {
            write!(out, "<tr data-row=\"{i}\" style=\"cursor: pointer\">")?;
            for cell in row {
                write!(out, "<td>{}</td>", escape_html(cell))?;
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");

        Ok(())
    }
}

/// Content of the results panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsPanel {
    /// Nothing has been searched yet.
    #[default]
    Empty,
    /// The latest search matched nothing.
    NoMatches,
    /// Results of the latest search.
    Table(ResultTable),
}

impl ResultsPanel {
    /// Renders a result set, replacing whatever was displayed before. The sort state starts over.
    pub fn render(records: Vec<FeatureRecord>, columns: &[Column]) -> Self {
        if records.is_empty() {
            Self::NoMatches
        } else {
            Self::Table(ResultTable::new(records, columns))
        }
    }

    /// The table, if results are displayed.
    pub fn table(&self) -> Option<&ResultTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The table, if results are displayed.
    pub fn table_mut(&mut self) -> Option<&mut ResultTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// HTML of the panel.
    pub fn to_html(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::NoMatches => format!("<p>{NO_MATCHES_TEXT}</p>"),
            Self::Table(table) => {
                let mut out = String::new();
                // Writing into a String does not fail.
                let _ = table.write_html(&mut out);
                out
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::feature::FeatureId;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("Tên Cây", "tencay"),
            Column::new("Loại Cây", "loaicay"),
            Column::new("Tuyến Đường", "tentuyendu"),
        ]
    }

    fn record(id: i64, name: &str, category: &str, road: &str) -> FeatureRecord {
        FeatureRecord::new(FeatureId(id), None)
            .with_attribute("tencay", name)
            .with_attribute("loaicay", category)
            .with_attribute("tentuyendu", road)
    }

    fn table() -> ResultTable {
        let records = vec![
            record(1, "sao", "B", "Lê Lợi"),
            record(2, " Bằng lăng", "A", "Hùng Vương"),
            record(3, "Muồng", "B", "Đống Đa"),
            record(4, "anh đào", "A", "Lê Lợi"),
        ];
        match ResultsPanel::render(records, &columns()) {
            ResultsPanel::Table(table) => table,
            other => panic!("unexpected panel {other:?}"),
        }
    }

    fn ids(table: &ResultTable) -> Vec<i64> {
        (0..table.row_count())
            .map(|i| table.row_record(i).unwrap().id().0)
            .collect()
    }

    #[test]
    fn empty_result() {
        let panel = ResultsPanel::render(vec![], &columns());
        assert_eq!(panel, ResultsPanel::NoMatches);
        assert_eq!(panel.to_html(), "<p>No matches found</p>");
        assert_eq!(ResultsPanel::default().to_html(), "");
    }

    #[test]
    fn click_sequence() {
        let mut table = table();
        assert_eq!(table.sort_state().column(), None);
        assert_eq!(table.headers(), vec!["Tên Cây", "Loại Cây", "Tuyến Đường"]);

        let state = table.sort_by(0).unwrap();
        assert_eq!(state.column(), Some(0));
        assert!(state.is_ascending());
        assert_eq!(ids(&table), vec![4, 2, 3, 1]);

        let state = table.sort_by(0).unwrap();
        assert!(!state.is_ascending());
        assert_eq!(ids(&table), vec![1, 3, 2, 4]);
        assert_eq!(table.headers()[0], "Tên Cây ▼");
    }

    #[test]
    fn other_column_resets_indicator() {
        let mut table = table();
        table.sort_by(2).unwrap();
        assert_eq!(table.headers()[2], "Tuyến Đường ▲");

        let state = table.sort_by(0).unwrap();
        assert!(state.is_ascending());
        assert_eq!(
            table.headers(),
            vec!["Tên Cây ▲", "Loại Cây", "Tuyến Đường"]
        );
    }

    #[test]
    fn stable_on_equal_keys() {
        let mut table = table();
        table.sort_by(0).unwrap();
        table.sort_by(0).unwrap();
        table.sort_by(1).unwrap();

        // Equal categories keep the descending name order of the previous sort.
        assert_eq!(ids(&table), vec![2, 4, 1, 3]);
    }

    #[test]
    fn unknown_column() {
        assert_matches!(table().sort_by(3), Err(ValidationError::UnknownColumn(3)));
    }

    #[test]
    fn html() {
        let mut table = table();
        table.sort_by(0).unwrap();
        let html = ResultsPanel::Table(table).to_html();

        assert!(html.starts_with("<table border=\"1\">"));
        assert!(html.contains(">Tên Cây ▲</th>"));
        assert!(html.contains("<tr data-row=\"0\" style=\"cursor: pointer\"><td>anh đào</td>"));
    }

    #[test]
    fn html_is_escaped() {
        let panel = ResultsPanel::render(
            vec![record(1, "<b>O'Brien</b>", "", "")],
            &columns(),
        );
        assert!(panel
            .to_html()
            .contains("<td>&lt;b&gt;O&#39;Brien&lt;/b&gt;</td>"));
    }
}
