//! # Design Lookup Tables
//!
//! Immutable, versioned tables from IS 456 used by every engine. The tables
//! are built once on first access and are read-only afterwards, so they can
//! be shared across rayon workers without synchronization.
//!
//! Lookups are sorted-array binary searches with linear interpolation between
//! the bracketing rows. A value outside the tabulated range is clamped to the
//! nearest end and the clamp is reported back to the caller, which decides
//! the severity of the resulting diagnostic.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::tables::design_tables;
//!
//! let tables = design_tables();
//! // τc for pt = 0.5 %, M25
//! let tau_c = tables.tau_c.lookup(0.5, 25.0);
//! assert!((tau_c.value - 0.49).abs() < 1e-9);
//! assert!(tau_c.row_clamp.is_none());
//! ```

mod is456;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Version tag for the bundled tables, reported with every design result
pub const TABLES_VERSION: &str = "IS456:2000(R2021)+SP16";

/// Record of a lookup argument that fell outside the tabulated range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clamp {
    /// Argument the caller asked for
    pub requested: f64,
    /// Table end actually used
    pub used: f64,
}

/// Result of a one-dimensional lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup {
    pub value: f64,
    pub clamp: Option<Clamp>,
}

/// Result of a two-dimensional lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup2 {
    pub value: f64,
    pub row_clamp: Option<Clamp>,
    pub col_clamp: Option<Clamp>,
}

/// Position of an argument between two breakpoints
#[derive(Debug, Clone, Copy)]
struct Bracket {
    lo: usize,
    hi: usize,
    /// Interpolation fraction in [0, 1] from `lo` to `hi`
    t: f64,
    clamp: Option<Clamp>,
}

fn bracket(keys: &[f64], x: f64) -> Bracket {
    let last = keys.len() - 1;
    if x <= keys[0] {
        let clamp = (x < keys[0]).then_some(Clamp { requested: x, used: keys[0] });
        return Bracket { lo: 0, hi: 0, t: 0.0, clamp };
    }
    if x >= keys[last] {
        let clamp = (x > keys[last]).then_some(Clamp { requested: x, used: keys[last] });
        return Bracket { lo: last, hi: last, t: 0.0, clamp };
    }
    // First key strictly greater than x; keys[hi - 1] <= x < keys[hi]
    let hi = keys.partition_point(|&k| k <= x);
    let lo = hi - 1;
    let t = (x - keys[lo]) / (keys[hi] - keys[lo]);
    Bracket { lo, hi, t, clamp: None }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Sorted one-dimensional breakpoint table
#[derive(Debug, Clone)]
pub struct InterpTable {
    pub name: &'static str,
    keys: Vec<f64>,
    values: Vec<f64>,
}

impl InterpTable {
    /// Build a table from `(key, value)` points.
    ///
    /// Points are sorted by key on construction so the source order of the
    /// literal data does not matter.
    pub fn new(name: &'static str, points: &[(f64, f64)]) -> Self {
        assert!(!points.is_empty(), "table {} has no points", name);
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        InterpTable {
            name,
            keys: sorted.iter().map(|p| p.0).collect(),
            values: sorted.iter().map(|p| p.1).collect(),
        }
    }

    pub fn lookup(&self, x: f64) -> Lookup {
        let b = bracket(&self.keys, x);
        Lookup {
            value: lerp(self.values[b.lo], self.values[b.hi], b.t),
            clamp: b.clamp,
        }
    }

    /// Smallest and largest tabulated keys
    pub fn key_range(&self) -> (f64, f64) {
        (self.keys[0], self.keys[self.keys.len() - 1])
    }
}

/// Two-dimensional table: rows and columns are both sorted breakpoints,
/// interpolated bilinearly.
#[derive(Debug, Clone)]
pub struct Table2D {
    pub name: &'static str,
    row_keys: Vec<f64>,
    col_keys: Vec<f64>,
    /// Row-major values, `values[row][col]`
    values: Vec<Vec<f64>>,
}

impl Table2D {
    pub fn new(name: &'static str, row_keys: &[f64], col_keys: &[f64], values: &[&[f64]]) -> Self {
        assert_eq!(row_keys.len(), values.len(), "table {} row count", name);
        assert!(
            values.iter().all(|r| r.len() == col_keys.len()),
            "table {} column count",
            name
        );
        assert!(row_keys.windows(2).all(|w| w[0] < w[1]), "table {} rows unsorted", name);
        assert!(col_keys.windows(2).all(|w| w[0] < w[1]), "table {} cols unsorted", name);
        Table2D {
            name,
            row_keys: row_keys.to_vec(),
            col_keys: col_keys.to_vec(),
            values: values.iter().map(|r| r.to_vec()).collect(),
        }
    }

    pub fn lookup(&self, row: f64, col: f64) -> Lookup2 {
        let r = bracket(&self.row_keys, row);
        let c = bracket(&self.col_keys, col);
        let lo = lerp(self.values[r.lo][c.lo], self.values[r.lo][c.hi], c.t);
        let hi = lerp(self.values[r.hi][c.lo], self.values[r.hi][c.hi], c.t);
        Lookup2 {
            value: lerp(lo, hi, r.t),
            row_clamp: r.clamp,
            col_clamp: c.clamp,
        }
    }

    pub fn row_range(&self) -> (f64, f64) {
        (self.row_keys[0], self.row_keys[self.row_keys.len() - 1])
    }
}

/// The full set of IS 456 tables used by the engines.
#[derive(Debug)]
pub struct DesignTables {
    pub version: &'static str,
    /// Table 19: τc (N/mm²) by tension steel percentage (rows) and fck (columns)
    pub tau_c: Table2D,
    /// Table 20: τc,max (N/mm²) by fck
    pub tau_c_max: InterpTable,
    /// 26.2.1.1: design bond stress τbd (N/mm²) for plain bars in tension by fck
    pub tau_bd: InterpTable,
    /// Table 21: permissible bending compression σcbc (N/mm²) by fck
    pub sigma_cbc: InterpTable,
    /// Fig. 4: tension reinforcement modification factor by fs (rows) and pt (columns)
    pub kt: Table2D,
    /// Fig. 5: compression reinforcement modification factor by pc
    pub kc: InterpTable,
    /// Fig. 6: flanged beam reduction factor by bw/bf
    pub kf: InterpTable,
}

static TABLES: Lazy<DesignTables> = Lazy::new(is456::build);

/// Shared read-only design tables, initialised on first call.
pub fn design_tables() -> &'static DesignTables {
    &TABLES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp_between_breakpoints() {
        let t = InterpTable::new("test", &[(0.0, 0.0), (10.0, 100.0)]);
        let l = t.lookup(2.5);
        assert!((l.value - 25.0).abs() < 1e-12);
        assert!(l.clamp.is_none());
    }

    #[test]
    fn test_interp_exact_breakpoint() {
        let t = InterpTable::new("test", &[(1.0, 5.0), (2.0, 7.0), (3.0, 11.0)]);
        assert_eq!(t.lookup(2.0).value, 7.0);
        assert_eq!(t.lookup(3.0).value, 11.0);
    }

    #[test]
    fn test_interp_unsorted_source() {
        let t = InterpTable::new("test", &[(3.0, 30.0), (1.0, 10.0), (2.0, 20.0)]);
        assert!((t.lookup(1.5).value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_interp_clamps_and_reports() {
        let t = InterpTable::new("test", &[(1.0, 5.0), (2.0, 7.0)]);
        let below = t.lookup(0.5);
        assert_eq!(below.value, 5.0);
        assert_eq!(below.clamp, Some(Clamp { requested: 0.5, used: 1.0 }));
        let above = t.lookup(9.0);
        assert_eq!(above.value, 7.0);
        assert_eq!(above.clamp.map(|c| c.used), Some(2.0));
    }

    #[test]
    fn test_tau_c_interpolates_steel_percent() {
        let tables = design_tables();
        // M25: 0.50 % -> 0.49, 0.75 % -> 0.57
        let l = tables.tau_c.lookup(0.625, 25.0);
        assert!((l.value - 0.53).abs() < 1e-9);
    }

    #[test]
    fn test_tau_c_interpolates_grade() {
        let tables = design_tables();
        // 1.00 %: M20 0.62, M25 0.64
        let l = tables.tau_c.lookup(1.0, 22.5);
        assert!((l.value - 0.63).abs() < 1e-9);
    }

    #[test]
    fn test_tau_c_high_grade_uses_last_column() {
        let tables = design_tables();
        let m40 = tables.tau_c.lookup(1.0, 40.0);
        let m60 = tables.tau_c.lookup(1.0, 60.0);
        assert_eq!(m40.value, m60.value);
    }

    #[test]
    fn test_tau_c_clamps_low_percentage() {
        let tables = design_tables();
        let l = tables.tau_c.lookup(0.05, 25.0);
        assert!(l.row_clamp.is_some());
        assert!((l.value - 0.29).abs() < 1e-9);
    }

    #[test]
    fn test_tau_c_max_table() {
        let tables = design_tables();
        assert_eq!(tables.tau_c_max.lookup(25.0).value, 3.1);
        assert_eq!(tables.tau_c_max.lookup(50.0).value, 4.0);
    }

    #[test]
    fn test_kt_decreases_with_steel_stress() {
        let tables = design_tables();
        let low = tables.kt.lookup(145.0, 1.0).value;
        let high = tables.kt.lookup(290.0, 1.0).value;
        assert!(low > high);
    }

    #[test]
    fn test_tables_are_shared() {
        let a = design_tables() as *const DesignTables;
        let b = design_tables() as *const DesignTables;
        assert_eq!(a, b);
        assert_eq!(design_tables().version, TABLES_VERSION);
    }
}
