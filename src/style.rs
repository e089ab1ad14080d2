//! Terminal styling utilities
//!
//! One small palette for all human-readable output:
//! - Semantic colors for status (green/yellow/red)
//! - Cyan for headers and technical terms
//!
//! Bold and dim come straight from crossterm's `Stylize`.

use crossterm::style::Stylize;

/// Extension trait for consistent SINKSW styling
///
/// # Examples
///
/// ```
/// use crossterm::style::Stylize;
/// use sinksw::style::SinkswStyle;
///
/// println!("{}", "SINKS:".header());
/// println!("{}", "active".success());
/// println!("{}", "57".technical());
/// ```
pub trait SinkswStyle: Stylize {
    /// Section headers (cyan bold)
    fn header(self) -> <<Self as Stylize>::Styled as Stylize>::Styled
    where
        Self: Sized,
        <Self as Stylize>::Styled: Stylize,
    {
        self.cyan().bold()
    }

    /// Success / resolved (green)
    fn success(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.green()
    }

    /// Errors / not found (red)
    fn error(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.red()
    }

    /// Warnings, e.g. duplicate rotation entries (yellow)
    fn warning(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.yellow()
    }

    /// Technical terms and identifiers: handles, counts, paths (cyan)
    fn technical(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.cyan()
    }
}

impl<T: Stylize> SinkswStyle for T {}
