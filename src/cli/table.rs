use terminal_size::{terminal_size, Width};

// Render rows as an ASCII table with a header, capped to the terminal width.
// Numeric-looking cells are right-aligned; overlong cells are truncated with
// an ellipsis.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let termw = get_terminal_width();
    crate::tprintln!("[cli.table] detected terminal width={} columns", termw);

    let cap = per_column_cap(termw, headers.len());
    let mut widths: Vec<usize> = headers.iter().map(|h| display_len(h).min(cap)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(headers.len()) {
            let w = display_len(cell);
            if w > widths[i] {
                widths[i] = w.min(cap);
            }
        }
    }

    let sep = build_separator(&widths);
    println!("{}", sep);
    println!("{}", build_row(&headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(), &widths));
    println!("{}", sep);
    for r in rows {
        println!("{}", build_row(r, &widths));
    }
    println!("{}", sep);
    println!("rows: {}", rows.len());
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => (w as usize).max(40),
        None => 120,
    }
}

fn per_column_cap(termw: usize, cols: usize) -> usize {
    if cols == 0 {
        return termw;
    }
    // Leave room for the "| " separators around each column
    let overhead = cols * 3 + 1;
    ((termw.saturating_sub(overhead)) / cols).max(8)
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        let pad = w.saturating_sub(display_len(&text));
        s.push(' ');
        if is_numeric_like(&cell) {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning counts to the right
    let st = s.trim();
    if st.is_empty() {
        return false;
    }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() {
            has_digit = true;
            continue;
        }
        if ".-+,_".contains(ch) {
            continue;
        }
        return false;
    }
    has_digit
}
