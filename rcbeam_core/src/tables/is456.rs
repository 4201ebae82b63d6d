//! Literal IS 456 table data.

use super::{DesignTables, InterpTable, Table2D, TABLES_VERSION};

/// Concrete grade columns of Table 19 (M40 column covers M40 and above)
const TAU_C_GRADES: [f64; 6] = [15.0, 20.0, 25.0, 30.0, 35.0, 40.0];

/// 100 As / (b d) rows of Table 19
const TAU_C_PT: [f64; 13] = [
    0.15, 0.25, 0.50, 0.75, 1.00, 1.25, 1.50, 1.75, 2.00, 2.25, 2.50, 2.75, 3.00,
];

#[rustfmt::skip]
const TAU_C: [[f64; 6]; 13] = [
    // M15   M20   M25   M30   M35   M40+
    [0.28, 0.28, 0.29, 0.29, 0.29, 0.30],
    [0.35, 0.36, 0.36, 0.37, 0.37, 0.38],
    [0.46, 0.48, 0.49, 0.50, 0.50, 0.51],
    [0.54, 0.56, 0.57, 0.59, 0.59, 0.60],
    [0.60, 0.62, 0.64, 0.66, 0.67, 0.68],
    [0.64, 0.67, 0.70, 0.71, 0.73, 0.74],
    [0.68, 0.72, 0.74, 0.76, 0.78, 0.79],
    [0.71, 0.75, 0.78, 0.80, 0.82, 0.84],
    [0.71, 0.79, 0.82, 0.84, 0.86, 0.88],
    [0.71, 0.81, 0.85, 0.88, 0.90, 0.92],
    [0.71, 0.82, 0.88, 0.91, 0.93, 0.95],
    [0.71, 0.82, 0.90, 0.94, 0.96, 0.98],
    [0.71, 0.82, 0.92, 0.96, 0.99, 1.01],
];

/// Service steel stress fs (N/mm²) rows of Fig. 4
const KT_FS: [f64; 5] = [120.0, 145.0, 190.0, 240.0, 290.0];

/// Tension steel percentage columns of Fig. 4
const KT_PT: [f64; 9] = [0.2, 0.4, 0.6, 0.8, 1.0, 1.5, 2.0, 2.5, 3.0];

#[rustfmt::skip]
const KT: [[f64; 9]; 5] = [
    //  0.2   0.4   0.6   0.8   1.0   1.5   2.0   2.5   3.0
    [2.00, 2.00, 2.00, 1.82, 1.64, 1.39, 1.25, 1.16, 1.10], // fs = 120
    [2.00, 2.00, 1.81, 1.58, 1.45, 1.25, 1.14, 1.06, 1.01], // fs = 145
    [2.00, 1.70, 1.43, 1.29, 1.20, 1.06, 0.98, 0.92, 0.88], // fs = 190
    [1.78, 1.33, 1.16, 1.07, 1.00, 0.90, 0.84, 0.80, 0.77], // fs = 240
    [1.39, 1.10, 0.98, 0.91, 0.86, 0.79, 0.74, 0.71, 0.69], // fs = 290
];

pub(super) fn build() -> DesignTables {
    let tau_c_rows: Vec<&[f64]> = TAU_C.iter().map(|r| r.as_slice()).collect();
    let kt_rows: Vec<&[f64]> = KT.iter().map(|r| r.as_slice()).collect();

    DesignTables {
        version: TABLES_VERSION,
        tau_c: Table2D::new("IS 456 Table 19", &TAU_C_PT, &TAU_C_GRADES, &tau_c_rows),
        tau_c_max: InterpTable::new(
            "IS 456 Table 20",
            &[
                (15.0, 2.5),
                (20.0, 2.8),
                (25.0, 3.1),
                (30.0, 3.5),
                (35.0, 3.7),
                (40.0, 4.0),
            ],
        ),
        tau_bd: InterpTable::new(
            "IS 456 26.2.1.1",
            &[
                (15.0, 1.0),
                (20.0, 1.2),
                (25.0, 1.4),
                (30.0, 1.5),
                (35.0, 1.7),
                (40.0, 1.9),
            ],
        ),
        sigma_cbc: InterpTable::new(
            "IS 456 Table 21",
            &[
                (15.0, 5.0),
                (20.0, 7.0),
                (25.0, 8.5),
                (30.0, 10.0),
                (35.0, 11.5),
                (40.0, 13.0),
                (45.0, 14.5),
                (50.0, 16.0),
            ],
        ),
        kt: Table2D::new("IS 456 Fig. 4", &KT_FS, &KT_PT, &kt_rows),
        kc: InterpTable::new(
            "IS 456 Fig. 5",
            &[
                (0.0, 1.00),
                (0.5, 1.14),
                (1.0, 1.25),
                (1.5, 1.33),
                (2.0, 1.40),
                (2.5, 1.45),
                (3.0, 1.50),
            ],
        ),
        kf: InterpTable::new("IS 456 Fig. 6", &[(0.3, 0.8), (1.0, 1.0)]),
    }
}
