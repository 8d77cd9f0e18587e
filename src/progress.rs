/// Console progress output
///
/// User-facing progress goes to stdout; diagnostics go through `tracing`.

use std::io::Write;

/// Width of the progress bar in characters
const BAR_WIDTH: usize = 50;

/// Render `<info>[####______] NN% done/total` ending in a carriage return
/// so successive calls overwrite the same console line
pub fn bar(done: usize, total: usize, info: &str) -> String {
    let percent = if total == 0 {
        100
    } else {
        ((done as f64 * 100.0) / total as f64).round() as usize
    };
    // done may exceed total; the bar never overflows
    let filled = ((BAR_WIDTH * percent) as f64 / 100.0).round() as usize;
    let filled = filled.min(BAR_WIDTH);

    format!(
        "{}[{}{}] {:>3}% {}/{}\r",
        info,
        "#".repeat(filled),
        "_".repeat(BAR_WIDTH - filled),
        percent,
        done,
        total
    )
}

/// Print one step of a temperature sweep, e.g. `	 5000.CR2 [###___] 33% 51/151`
pub fn temperature_step(done: usize, total: usize, temperature: u32, extension: &str) {
    let info = format!("\t{:>5}.{} ", temperature, extension);
    print!("{}", bar(done, total, &info));
    let _ = std::io::stdout().flush();
}

/// Start a photo's console line, e.g. `	- IMG_0001.CR2 -- `
pub fn photo(name: &str) {
    print!("\t- {} -- ", name);
    let _ = std::io::stdout().flush();
}

/// Finish the current console line
pub fn finish(text: &str) {
    println!("{}", text);
}

/// Print a line prefixed with a tab, or an empty line
pub fn line(text: &str) {
    if text.is_empty() {
        println!();
    } else {
        println!("\t{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_half_done() {
        let rendered = bar(1, 2, "x ");
        assert_eq!(
            rendered,
            format!("x [{}{}]  50% 1/2\r", "#".repeat(25), "_".repeat(25))
        );
    }

    #[test]
    fn test_bar_clamps_overflow() {
        let rendered = bar(5, 2, "");
        assert!(rendered.starts_with(&format!("[{}]", "#".repeat(50))));
        assert!(rendered.contains("250% 5/2"));
    }

    #[test]
    fn test_bar_complete() {
        let rendered = bar(151, 151, "");
        assert!(rendered.contains("100% 151/151"));
        assert!(!rendered.contains('_'));
    }
}
