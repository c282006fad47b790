use papercut::blocks::{block_index_of_item, Block};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// One styled word waiting to be laid out.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: Style,
}

impl Cell {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Lays `cells` out in lines of at most `width` columns, each line starting
/// with `edge`. Returns the lines and, for each cell, the line it landed on.
/// A word wider than the line gets a line of its own.
pub fn wrap_cells(
    cells: Vec<Cell>,
    width: usize,
    edge: &'static str,
    edge_style: Style,
) -> (Vec<Line<'static>>, Vec<usize>) {
    let avail = width.saturating_sub(UnicodeWidthStr::width(edge)).max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut rows = Vec::with_capacity(cells.len());
    let mut current: Vec<Span<'static>> = vec![Span::styled(edge, edge_style)];
    let mut used = 0usize;

    for cell in cells {
        let w = UnicodeWidthStr::width(cell.text.as_str());
        if used > 0 && used + 1 + w > avail {
            let done = std::mem::replace(&mut current, vec![Span::styled(edge, edge_style)]);
            lines.push(Line::from(done));
            used = 0;
        }
        if used > 0 {
            current.push(Span::raw(" "));
            used += 1;
        }
        rows.push(lines.len());
        current.push(Span::styled(cell.text, cell.style));
        used += w;
    }
    lines.push(Line::from(current));
    (lines, rows)
}

/// Scroll offset that keeps `line` inside a viewport of `height` lines.
pub fn follow(scroll: usize, line: Option<usize>, height: usize, total: usize) -> usize {
    let height = height.max(1);
    let max_scroll = total.saturating_sub(height);
    let scroll = match line {
        Some(line) if line < scroll => line,
        Some(line) if line >= scroll + height => line + 1 - height,
        _ => scroll,
    };
    scroll.min(max_scroll)
}

/// Block id and offset of content item `item`.
pub fn item_position(blocks: &[Block], item: usize) -> Option<(String, usize)> {
    let idx = block_index_of_item(blocks, item)?;
    let block = &blocks[idx];
    Some((block.id.clone(), item - block.start))
}

#[cfg(test)]
mod tests {
    use super::{follow, item_position, wrap_cells, Cell};
    use papercut::blocks::{derive_blocks, SegmentationRule};
    use papercut::id::SequentialIdGen;
    use papercut::WordRecord;
    use ratatui::style::Style;

    fn cells(words: &[&str]) -> Vec<Cell> {
        words.iter().map(|w| Cell::new(*w, Style::default())).collect()
    }

    fn text(line: &ratatui::text::Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wraps_words_behind_edge() {
        let (lines, rows) = wrap_cells(cells(&["one", "two", "three"]), 11, "| ", Style::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(text(&lines[0]), "| one two");
        assert_eq!(text(&lines[1]), "| three");
        assert_eq!(rows, [0, 0, 1]);
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let (lines, rows) = wrap_cells(cells(&["a", "abcdefghij", "b"]), 6, "| ", Style::default());
        assert_eq!(rows, [0, 1, 2]);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_input_still_draws_edge() {
        let (lines, rows) = wrap_cells(Vec::new(), 10, "| ", Style::default());
        assert_eq!(lines.len(), 1);
        assert!(rows.is_empty());
    }

    #[test]
    fn follow_keeps_line_visible() {
        assert_eq!(follow(0, Some(12), 10, 40), 3);
        assert_eq!(follow(8, Some(2), 10, 40), 2);
        assert_eq!(follow(5, Some(7), 10, 40), 5);
        assert_eq!(follow(30, None, 10, 20), 10);
    }

    #[test]
    fn maps_items_to_block_offsets() {
        let content = vec![
            WordRecord::new("Hi", "A"),
            WordRecord::new("there", "A"),
            WordRecord::new("Bye", "B"),
        ];
        let blocks = derive_blocks(&content, SegmentationRule::Speaker, &mut SequentialIdGen::default());
        assert_eq!(item_position(&blocks, 2), Some(("block-1".to_string(), 0)));
        assert_eq!(item_position(&blocks, 1), Some(("block-0".to_string(), 1)));
        assert_eq!(item_position(&blocks, 3), None);
    }
}
