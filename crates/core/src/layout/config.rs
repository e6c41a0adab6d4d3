//! Breakpoint layout configuration.
//!
//! Patterns are parsed and validated once, when configuration is loaded.
//! After that a [`LayoutConfig`] is immutable and can be shared freely.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pattern::{LayoutConfigError, RowPattern, SlotKind};

/// Responsive breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    /// All breakpoints, widest first.
    pub const ALL: [Self; 3] = [Self::Desktop, Self::Tablet, Self::Mobile];

    /// Lowercase name used in URLs and config files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown breakpoint name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown breakpoint: {0}")]
pub struct UnknownBreakpoint(pub String);

impl FromStr for Breakpoint {
    type Err = UnknownBreakpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            other => Err(UnknownBreakpoint(other.to_owned())),
        }
    }
}

/// How a breakpoint places its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrangement {
    /// Cyclic row patterns interleaving products and text.
    Patterned {
        rows: Vec<RowPattern>,
        columns: usize,
    },
    /// One product per row, no text.
    SingleColumn,
}

/// Layout configuration for one breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    breakpoint: Breakpoint,
    arrangement: Arrangement,
}

impl LayoutConfig {
    /// Build a patterned configuration from parsed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rows, if rows differ in width, or if
    /// no row has a product slot (the layout could never place a product).
    pub fn patterned(
        breakpoint: Breakpoint,
        rows: Vec<RowPattern>,
    ) -> Result<Self, LayoutConfigError> {
        let expected = rows.first().ok_or(LayoutConfigError::NoRows)?.width();

        if let Some((row, pattern)) = rows
            .iter()
            .enumerate()
            .find(|(_, pattern)| pattern.width() != expected)
        {
            return Err(LayoutConfigError::WidthMismatch {
                row: row + 1,
                expected,
                found: pattern.width(),
            });
        }

        if rows.iter().all(|pattern| pattern.product_slots() == 0) {
            return Err(LayoutConfigError::NoProductSlots);
        }

        Ok(Self {
            breakpoint,
            arrangement: Arrangement::Patterned {
                rows,
                columns: expected,
            },
        })
    }

    /// Parse pattern strings such as `"S P P S"` and build a patterned configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to parse or the rows fail
    /// validation (see [`LayoutConfig::patterned`]).
    pub fn from_patterns<I, S>(breakpoint: Breakpoint, patterns: I) -> Result<Self, LayoutConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = patterns
            .into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<RowPattern>, _>>()?;
        Self::patterned(breakpoint, rows)
    }

    /// One product per row, in order, with no text.
    #[must_use]
    pub const fn single_column(breakpoint: Breakpoint) -> Self {
        Self {
            breakpoint,
            arrangement: Arrangement::SingleColumn,
        }
    }

    #[must_use]
    pub const fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    #[must_use]
    pub const fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        match &self.arrangement {
            Arrangement::Patterned { columns, .. } => *columns,
            Arrangement::SingleColumn => 1,
        }
    }

    /// Row patterns (empty for single-column layouts).
    #[must_use]
    pub fn rows(&self) -> &[RowPattern] {
        match &self.arrangement {
            Arrangement::Patterned { rows, .. } => rows,
            Arrangement::SingleColumn => &[],
        }
    }

    /// Stock configuration, built from rows known to be valid.
    fn stock(breakpoint: Breakpoint, rows: &[&[SlotKind]]) -> Self {
        let rows: Vec<RowPattern> = rows
            .iter()
            .filter_map(|slots| RowPattern::new(slots.to_vec()).ok())
            .collect();
        let columns = rows.first().map_or(1, RowPattern::width);
        Self {
            breakpoint,
            arrangement: Arrangement::Patterned { rows, columns },
        }
    }
}

/// Layout configuration for every breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveLayout {
    pub desktop: LayoutConfig,
    pub tablet: LayoutConfig,
    pub mobile: LayoutConfig,
}

impl ResponsiveLayout {
    /// Configuration for a breakpoint.
    #[must_use]
    pub const fn get(&self, breakpoint: Breakpoint) -> &LayoutConfig {
        match breakpoint {
            Breakpoint::Desktop => &self.desktop,
            Breakpoint::Tablet => &self.tablet,
            Breakpoint::Mobile => &self.mobile,
        }
    }
}

impl Default for ResponsiveLayout {
    /// The storefront's stock layout: four columns on desktop, three on
    /// tablet, a single column on mobile.
    fn default() -> Self {
        use SlotKind::{Product as P, Spacer as S};

        Self {
            desktop: LayoutConfig::stock(
                Breakpoint::Desktop,
                &[&[S, P, P, S], &[P, S, P, P], &[P, P, S, P]],
            ),
            tablet: LayoutConfig::stock(Breakpoint::Tablet, &[&[S, P, P], &[P, P, S], &[P, S, P]]),
            mobile: LayoutConfig::single_column(Breakpoint::Mobile),
        }
    }
}

/// Serialized arrangement of one breakpoint, as written in a layout file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "arrangement", rename_all = "snake_case")]
pub enum ArrangementFile {
    Patterned { rows: Vec<String> },
    SingleColumn,
}

/// Layout file contents. Breakpoints left out keep the stock layout.
///
/// ```yaml
/// desktop:
///   arrangement: patterned
///   rows: ["S P P S", "P S P P"]
/// mobile:
///   arrangement: single_column
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutFile {
    #[serde(default)]
    pub desktop: Option<ArrangementFile>,
    #[serde(default)]
    pub tablet: Option<ArrangementFile>,
    #[serde(default)]
    pub mobile: Option<ArrangementFile>,
}

impl ArrangementFile {
    fn into_config(self, breakpoint: Breakpoint) -> Result<LayoutConfig, LayoutConfigError> {
        match self {
            Self::Patterned { rows } => LayoutConfig::from_patterns(breakpoint, rows),
            Self::SingleColumn => Ok(LayoutConfig::single_column(breakpoint)),
        }
    }
}

impl TryFrom<LayoutFile> for ResponsiveLayout {
    type Error = LayoutConfigError;

    fn try_from(file: LayoutFile) -> Result<Self, Self::Error> {
        let stock = Self::default();
        let resolve = |entry: Option<ArrangementFile>, breakpoint: Breakpoint| match entry {
            Some(entry) => entry.into_config(breakpoint),
            None => Ok(stock.get(breakpoint).clone()),
        };

        Ok(Self {
            desktop: resolve(file.desktop, Breakpoint::Desktop)?,
            tablet: resolve(file.tablet, Breakpoint::Tablet)?,
            mobile: resolve(file.mobile, Breakpoint::Mobile)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_patterns_sets_columns() {
        let config = LayoutConfig::from_patterns(Breakpoint::Desktop, ["S P P S", "P S P P"]).unwrap();
        assert_eq!(config.columns(), 4);
        assert_eq!(config.rows().len(), 2);
        assert_eq!(config.breakpoint(), Breakpoint::Desktop);
    }

    #[test]
    fn test_rejects_no_rows() {
        let err = LayoutConfig::from_patterns(Breakpoint::Tablet, Vec::<&str>::new()).unwrap_err();
        assert_eq!(err, LayoutConfigError::NoRows);
    }

    #[test]
    fn test_rejects_width_mismatch() {
        let err = LayoutConfig::from_patterns(Breakpoint::Desktop, ["S P P S", "P S P"]).unwrap_err();
        assert_eq!(
            err,
            LayoutConfigError::WidthMismatch {
                row: 2,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_rejects_text_only_patterns() {
        let err = LayoutConfig::from_patterns(Breakpoint::Desktop, ["S S", "S S"]).unwrap_err();
        assert_eq!(err, LayoutConfigError::NoProductSlots);
    }

    #[test]
    fn test_stock_layout_is_valid() {
        let stock = ResponsiveLayout::default();
        for breakpoint in [Breakpoint::Desktop, Breakpoint::Tablet] {
            let config = stock.get(breakpoint);
            let revalidated = LayoutConfig::patterned(breakpoint, config.rows().to_vec()).unwrap();
            assert_eq!(&revalidated, config);
        }
        assert_eq!(stock.desktop.columns(), 4);
        assert_eq!(stock.tablet.columns(), 3);
        assert_eq!(stock.mobile.arrangement(), &Arrangement::SingleColumn);
    }

    #[test]
    fn test_breakpoint_parse_and_display() {
        for breakpoint in Breakpoint::ALL {
            assert_eq!(breakpoint.as_str().parse::<Breakpoint>().unwrap(), breakpoint);
        }
        assert!("watch".parse::<Breakpoint>().is_err());
    }

    #[test]
    fn test_layout_file_from_yaml() {
        let yaml = r#"
desktop:
  arrangement: patterned
  rows: ["P P S", "S P P"]
mobile:
  arrangement: single_column
"#;
        let file: LayoutFile = serde_yaml::from_str(yaml).unwrap();
        let layout = ResponsiveLayout::try_from(file).unwrap();

        assert_eq!(layout.desktop.columns(), 3);
        assert_eq!(layout.desktop.rows()[0].to_string(), "P P S");
        // Tablet was not given and keeps the stock layout.
        assert_eq!(layout.tablet, ResponsiveLayout::default().tablet);
    }

    #[test]
    fn test_layout_file_invalid_pattern_is_rejected() {
        let file = LayoutFile {
            tablet: Some(ArrangementFile::Patterned {
                rows: vec!["P Q".to_string()],
            }),
            ..LayoutFile::default()
        };
        assert!(matches!(
            ResponsiveLayout::try_from(file),
            Err(LayoutConfigError::InvalidSlot { slot: 'Q', .. })
        ));
    }
}
