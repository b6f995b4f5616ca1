// src/schema/types.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::AnalyticsError,
    table::{Column, ColumnType},
};

/// The six base datasets of the crash extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dataset {
    Charges,
    Damages,
    Endorse,
    #[serde(rename = "Primary_Person")]
    PrimaryPerson,
    Units,
    Restrict,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Charges,
        Dataset::Damages,
        Dataset::Endorse,
        Dataset::PrimaryPerson,
        Dataset::Units,
        Dataset::Restrict,
    ];

    /// Name used as the configuration key and as the table name.
    pub fn key(self) -> &'static str {
        match self {
            Dataset::Charges => "Charges",
            Dataset::Damages => "Damages",
            Dataset::Endorse => "Endorse",
            Dataset::PrimaryPerson => "Primary_Person",
            Dataset::Units => "Units",
            Dataset::Restrict => "Restrict",
        }
    }

    /// Columns with a declared semantic type. Anything else in the file
    /// loads as free text.
    pub fn declared(self) -> &'static [(&'static str, ColumnType)] {
        use crate::table::ColumnType::{Categorical as Cat, Integer as Int, String as Text};
        match self {
            Dataset::Charges => &[
                ("CRASH_ID", Int),
                ("UNIT_NBR", Int),
                ("PRSN_NBR", Int),
                ("CHARGE", Text),
                ("CITATION_NBR", Text),
            ],
            Dataset::Damages => &[("CRASH_ID", Int), ("DAMAGED_PROPERTY", Cat)],
            Dataset::Endorse => &[
                ("CRASH_ID", Int),
                ("UNIT_NBR", Int),
                ("DRVR_LIC_ENDORS_ID", Cat),
            ],
            Dataset::Restrict => &[
                ("CRASH_ID", Int),
                ("UNIT_NBR", Int),
                ("DRVR_LIC_RESTRIC_ID", Cat),
            ],
            Dataset::PrimaryPerson => &[
                ("CRASH_ID", Int),
                ("UNIT_NBR", Int),
                ("PRSN_NBR", Int),
                ("PRSN_TYPE_ID", Cat),
                ("PRSN_INJRY_SEV_ID", Cat),
                ("PRSN_AGE", Int),
                ("PRSN_ETHNICITY_ID", Cat),
                ("PRSN_GNDR_ID", Cat),
                ("PRSN_HELMET_ID", Cat),
                ("PRSN_ALC_RSLT_ID", Cat),
                ("TOT_INJRY_CNT", Int),
                ("DEATH_CNT", Int),
                ("DRVR_LIC_TYPE_ID", Cat),
                ("DRVR_LIC_STATE_ID", Cat),
                ("DRVR_LIC_CLS_ID", Cat),
                ("DRVR_ZIP", Text),
            ],
            Dataset::Units => &[
                ("CRASH_ID", Int),
                ("UNIT_NBR", Int),
                ("UNIT_DESC_ID", Cat),
                ("VEH_LIC_STATE_ID", Cat),
                ("VEH_MOD_YEAR", Int),
                ("VEH_COLOR_ID", Cat),
                ("VEH_MAKE_ID", Cat),
                ("VEH_MOD_ID", Cat),
                ("VEH_BODY_STYL_ID", Cat),
                ("FIN_RESP_TYPE_ID", Cat),
                ("VEH_DMAG_SCL_1_ID", Cat),
                ("VEH_DMAG_SCL_2_ID", Cat),
                ("CONTRIB_FACTR_1_ID", Cat),
                ("CONTRIB_FACTR_2_ID", Cat),
                ("CONTRIB_FACTR_P1_ID", Cat),
                ("TOT_INJRY_CNT", Int),
                ("DEATH_CNT", Int),
            ],
        }
    }

    /// Declared type of `name`, `String` when undeclared.
    pub fn column_type(self, name: &str) -> ColumnType {
        self.declared()
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(ColumnType::String, |(_, ty)| *ty)
    }

    /// Schema for a file whose header is `names`.
    pub fn columns_for(self, names: &[String]) -> Vec<Column> {
        names
            .iter()
            .map(|n| Column::new(n.as_str(), self.column_type(n)))
            .collect()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dataset {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.key() == s)
            .ok_or_else(|| AnalyticsError::Config(format!("unknown dataset `{}`", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for d in Dataset::ALL {
            assert_eq!(d.key().parse::<Dataset>().unwrap(), d);
        }
        assert!("Vehicles".parse::<Dataset>().is_err());
    }

    #[test]
    fn undeclared_columns_are_text() {
        let cols = Dataset::Units.columns_for(&["CRASH_ID".into(), "VIN".into()]);
        assert_eq!(cols[0].ty, ColumnType::Integer);
        assert_eq!(cols[1].ty, ColumnType::String);
        assert_eq!(
            Dataset::PrimaryPerson.column_type("DRVR_ZIP"),
            ColumnType::String
        );
    }
}
