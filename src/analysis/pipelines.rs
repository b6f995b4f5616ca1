//! One function per analysis. Each takes the base tables and returns the
//! printed value together with the table destined for the sink.

use tracing::debug;

use super::{AnalysisOutcome, AnalysisValue, Datasets};
use crate::{
    error::Result,
    expr::col,
    ops::{
        distinct, drop_columns, drop_nulls, derive, filter, group_by_aggregate, inner_join, limit,
        project, set_difference_by_key, sort, window_rank, Aggregate,
    },
    schema::Dataset,
    table::{Table, Value},
};

const BODY_STYLE_SENTINELS: [&str; 4] = [
    "NA",
    "NOT REPORTED",
    "OTHER  (EXPLAIN IN NARRATIVE)",
    "UNKNOWN",
];
const ETHNICITY_SENTINELS: [&str; 2] = ["NA", "UNKNOWN"];
const DAMAGE_SCALE_SENTINELS: [&str; 3] = ["NA", "NO DAMAGE", "INVALID VALUE"];
const NO_PROPERTY_DAMAGE: [&str; 2] = ["NONE", "NONE1"];
const INSURED: [&str; 3] = [
    "PROOF OF LIABILITY INSURANCE",
    "CERTIFICATE OF SELF-INSURANCE",
    "LIABILITY INSURANCE POLICY",
];
const LICENSED: [&str; 2] = ["COMMERCIAL DRIVER LIC.", "DRIVER LICENSE"];

fn traced(step: &str, table: Table) -> Table {
    debug!(step, table = table.name(), rows = table.num_rows(), "intermediate");
    table
}

/// `group_by(column).count()` sorted by count, largest first.
fn frequency(table: &Table, column: &str) -> Result<Table> {
    let counts = group_by_aggregate(table, &[column], &[Aggregate::count()])?;
    sort(&counts, "count", true)
}

/// 1. Person records whose gender is MALE.
pub fn male_crash_count(data: &Datasets) -> Result<AnalysisOutcome> {
    let persons = data.get(Dataset::PrimaryPerson)?;
    let males = filter(persons, &col("PRSN_GNDR_ID").equals("MALE"))?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::Count(males.num_rows() as u64),
        output: males,
    })
}

/// 2. Units whose body style mentions MOTORCYCLE.
pub fn two_wheeler_count(data: &Datasets) -> Result<AnalysisOutcome> {
    let units = data.get(Dataset::Units)?;
    let two_wheelers = filter(units, &col("VEH_BODY_STYL_ID").contains("MOTORCYCLE"))?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::Count(two_wheelers.num_rows() as u64),
        output: two_wheelers,
    })
}

/// 3. Licence state of the most female person records; an empty list when
///    there are none.
pub fn top_female_state(data: &Datasets) -> Result<AnalysisOutcome> {
    let persons = data.get(Dataset::PrimaryPerson)?;
    let females = traced(
        "females",
        filter(persons, &col("PRSN_GNDR_ID").equals("FEMALE"))?,
    );
    let states = frequency(&females, "DRVR_LIC_STATE_ID")?;
    let top = states.first_value("DRVR_LIC_STATE_ID")?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::List(top.into_iter().collect()),
        output: states,
    })
}

/// 4. Makes ranked 6th to 15th by total injuries plus deaths. The sink gets
///    the full ranking.
pub fn top_makes_by_casualties(data: &Datasets) -> Result<AnalysisOutcome> {
    let units = data.get(Dataset::Units)?;
    let known = traced("known makes", filter(units, &col("VEH_MAKE_ID").not_equals("NA"))?);
    let casualties = derive(
        &known,
        "TOT_CASUALTY",
        &(col("TOT_INJRY_CNT") + col("DEATH_CNT")),
    )?;
    let per_make = group_by_aggregate(
        &casualties,
        &["VEH_MAKE_ID"],
        &[Aggregate::sum("TOT_CASUALTY").alias("TOT_CASUALTIES_CNT_AGG")],
    )?;
    let ranked = traced("ranked makes", sort(&per_make, "TOT_CASUALTIES_CNT_AGG", true)?);
    let slice = set_difference_by_key(&limit(&ranked, 15), &limit(&ranked, 5), &["VEH_MAKE_ID"])?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::List(slice.column_values("VEH_MAKE_ID")?),
        output: ranked,
    })
}

/// 5. Most frequent ethnicity of each body style, ties broken by first
///    appearance. Sorted by body style.
pub fn top_ethnicity_per_body_style(data: &Datasets) -> Result<AnalysisOutcome> {
    let units = data.get(Dataset::Units)?;
    let persons = data.get(Dataset::PrimaryPerson)?;

    let joined = traced("units x persons", inner_join(units, persons, "CRASH_ID")?);
    let known = filter(
        &joined,
        &(!col("VEH_BODY_STYL_ID").is_in(BODY_STYLE_SENTINELS))
            .and(!col("PRSN_ETHNICITY_ID").is_in(ETHNICITY_SENTINELS)),
    )?;
    let counts = group_by_aggregate(
        &known,
        &["VEH_BODY_STYL_ID", "PRSN_ETHNICITY_ID"],
        &[Aggregate::count()],
    )?;
    let ranked = window_rank(&counts, &["VEH_BODY_STYL_ID"], "count", true, "row_num")?;
    let top = filter(&ranked, &col("row_num").equals(1))?;
    let top = drop_columns(&top, &["row_num", "count"])?;
    let top = sort(&top, "VEH_BODY_STYL_ID", false)?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::Table(top.clone()),
        output: top,
    })
}

/// 6. Five driver zip codes with the most alcohol-related unit/person rows.
pub fn top_alcohol_zip_codes(data: &Datasets) -> Result<AnalysisOutcome> {
    let units = data.get(Dataset::Units)?;
    let persons = data.get(Dataset::PrimaryPerson)?;

    let joined = traced("units x persons", inner_join(units, persons, "CRASH_ID")?);
    let with_zip = drop_nulls(&joined, &["DRVR_ZIP"])?;
    let alcohol = traced(
        "alcohol",
        filter(
            &with_zip,
            &col("CONTRIB_FACTR_1_ID")
                .contains("ALCOHOL")
                .or(col("CONTRIB_FACTR_2_ID").contains("ALCOHOL")),
        )?,
    );
    let top = limit(&frequency(&alcohol, "DRVR_ZIP")?, 5);
    Ok(AnalysisOutcome {
        value: AnalysisValue::List(top.column_values("DRVR_ZIP")?),
        output: top,
    })
}

/// 7. Distinct crash ids with a damage level above "DAMAGED 4", no damaged
///    property and an insurance-backed financial responsibility type.
///
/// Damage levels compare as text, so "DAMAGED 5".."DAMAGED 7" qualify and
/// the sentinel labels have to be excluded explicitly.
pub fn insured_high_damage_crashes(data: &Datasets) -> Result<AnalysisOutcome> {
    let damages = data.get(Dataset::Damages)?;
    let units = data.get(Dataset::Units)?;

    let joined = traced("damages x units", inner_join(damages, units, "CRASH_ID")?);
    let above_four = |scale: &str| {
        col(scale)
            .gt("DAMAGED 4")
            .and(!col(scale).is_in(DAMAGE_SCALE_SENTINELS))
    };
    let damaged = filter(
        &joined,
        &above_four("VEH_DMAG_SCL_1_ID").or(above_four("VEH_DMAG_SCL_2_ID")),
    )?;
    let no_property = filter(&damaged, &col("DAMAGED_PROPERTY").is_in(NO_PROPERTY_DAMAGE))?;
    let insured = traced(
        "insured",
        filter(&no_property, &col("FIN_RESP_TYPE_ID").is_in(INSURED))?,
    );
    let ids = sort(&distinct(&project(&insured, &["CRASH_ID"])?), "CRASH_ID", false)?;
    Ok(AnalysisOutcome {
        value: AnalysisValue::List(ids.column_values("CRASH_ID")?),
        output: ids,
    })
}

/// 8. Five makes with the most speeding charges among licensed drivers,
///    restricted to the ten most common colours and the selected licence
///    states.
///
/// The state set is the 25 most frequent `VEH_LIC_STATE_ID` values that are
/// not integer codes; it is not ranked by offence count.
pub fn top_speeding_makes(data: &Datasets) -> Result<AnalysisOutcome> {
    let charges = data.get(Dataset::Charges)?;
    let persons = data.get(Dataset::PrimaryPerson)?;
    let units = data.get(Dataset::Units)?;

    // 1) colour and state sets
    let colours = filter(units, &col("VEH_COLOR_ID").not_equals("NA"))?;
    let top_colours: Vec<Value> =
        limit(&frequency(&colours, "VEH_COLOR_ID")?, 10).column_values("VEH_COLOR_ID")?;
    let states = filter(units, &col("VEH_LIC_STATE_ID").try_cast_int().is_null())?;
    let top_states: Vec<Value> =
        limit(&frequency(&states, "VEH_LIC_STATE_ID")?, 25).column_values("VEH_LIC_STATE_ID")?;
    debug!(colours = top_colours.len(), states = top_states.len(), "selection sets");

    // 2) charges x persons x units funnel
    let joined = inner_join(charges, persons, "CRASH_ID")?;
    let joined = traced("charges x persons x units", inner_join(&joined, units, "CRASH_ID")?);
    let funnel = col("CHARGE")
        .contains("SPEED")
        .and(col("DRVR_LIC_TYPE_ID").is_in(LICENSED))
        .and(col("VEH_COLOR_ID").is_in(top_colours))
        .and(col("VEH_LIC_STATE_ID").is_in(top_states));
    let speeding = traced("funnel", filter(&joined, &funnel)?);

    let top = limit(&frequency(&speeding, "VEH_MAKE_ID")?, 5);
    Ok(AnalysisOutcome {
        value: AnalysisValue::List(top.column_values("VEH_MAKE_ID")?),
        output: top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType};

    fn table(name: &str, columns: &[(&str, ColumnType)], rows: Vec<Vec<(&str, Value)>>) -> Table {
        Table::from_records(
            name,
            columns.iter().map(|&(n, ty)| Column::new(n, ty)).collect(),
            rows,
        )
        .unwrap()
    }

    fn persons(rows: &[(i64, &str, &str, &str, Option<&str>)]) -> Table {
        table(
            "Primary_Person",
            &[
                ("CRASH_ID", ColumnType::Integer),
                ("UNIT_NBR", ColumnType::Integer),
                ("PRSN_GNDR_ID", ColumnType::Categorical),
                ("DRVR_LIC_STATE_ID", ColumnType::Categorical),
                ("PRSN_ETHNICITY_ID", ColumnType::Categorical),
                ("DRVR_LIC_TYPE_ID", ColumnType::Categorical),
                ("DRVR_ZIP", ColumnType::String),
            ],
            rows.iter()
                .map(|&(id, gender, state, ethnicity, zip)| {
                    vec![
                        ("CRASH_ID", Value::Int(id)),
                        ("UNIT_NBR", Value::Int(1)),
                        ("PRSN_GNDR_ID", Value::from(gender)),
                        ("DRVR_LIC_STATE_ID", Value::from(state)),
                        ("PRSN_ETHNICITY_ID", Value::from(ethnicity)),
                        ("DRVR_LIC_TYPE_ID", Value::from("DRIVER LICENSE")),
                        ("DRVR_ZIP", Value::from(zip)),
                    ]
                })
                .collect(),
        )
    }

    fn units(rows: Vec<Vec<(&str, Value)>>) -> Table {
        table(
            "Units",
            &[
                ("CRASH_ID", ColumnType::Integer),
                ("UNIT_NBR", ColumnType::Integer),
                ("VEH_BODY_STYL_ID", ColumnType::Categorical),
                ("VEH_MAKE_ID", ColumnType::Categorical),
                ("VEH_COLOR_ID", ColumnType::Categorical),
                ("VEH_LIC_STATE_ID", ColumnType::Categorical),
                ("TOT_INJRY_CNT", ColumnType::Integer),
                ("DEATH_CNT", ColumnType::Integer),
                ("CONTRIB_FACTR_1_ID", ColumnType::Categorical),
                ("CONTRIB_FACTR_2_ID", ColumnType::Categorical),
                ("VEH_DMAG_SCL_1_ID", ColumnType::Categorical),
                ("VEH_DMAG_SCL_2_ID", ColumnType::Categorical),
                ("FIN_RESP_TYPE_ID", ColumnType::Categorical),
            ],
            rows,
        )
    }

    fn strings(values: &[&str]) -> AnalysisValue {
        AnalysisValue::List(values.iter().map(|&s| Value::from(s)).collect())
    }

    fn assert_list(outcome: &AnalysisOutcome, expected: AnalysisValue) {
        assert_eq!(outcome.value.to_string(), expected.to_string());
    }

    #[test]
    fn male_count_counts_person_rows() {
        let data = Datasets::from_tables([(
            Dataset::PrimaryPerson,
            persons(&[
                (1, "MALE", "TX", "WHITE", None),
                (2, "FEMALE", "TX", "WHITE", None),
                (3, "MALE", "TX", "WHITE", None),
            ]),
        )]);
        let outcome = male_crash_count(&data).unwrap();
        assert_eq!(outcome.value.to_string(), "2");
        assert_eq!(outcome.output.num_rows(), 2);
        // rerunning over the same tables gives the same answer
        assert_eq!(male_crash_count(&data).unwrap().value.to_string(), "2");
    }

    #[test]
    fn two_wheelers_match_by_substring() {
        let data = Datasets::from_tables([(
            Dataset::Units,
            units(vec![
                vec![("CRASH_ID", Value::Int(1)), ("VEH_BODY_STYL_ID", Value::from("MOTORCYCLE"))],
                vec![("CRASH_ID", Value::Int(2)), ("VEH_BODY_STYL_ID", Value::from("POLICE MOTORCYCLE"))],
                vec![("CRASH_ID", Value::Int(3)), ("VEH_BODY_STYL_ID", Value::from("PICKUP"))],
                vec![("CRASH_ID", Value::Int(4))],
            ]),
        )]);
        assert_eq!(two_wheeler_count(&data).unwrap().value.to_string(), "2");
    }

    #[test]
    fn female_state_is_the_most_frequent() {
        let mut rows = vec![(1, "FEMALE", "TX", "W", None); 3];
        rows.push((2, "FEMALE", "CA", "W", None));
        rows.extend(vec![(3, "MALE", "TX", "W", None); 5]);
        let data = Datasets::from_tables([(Dataset::PrimaryPerson, persons(&rows))]);

        let outcome = top_female_state(&data).unwrap();
        assert_list(&outcome, strings(&["TX"]));
        assert_eq!(
            outcome.output.record(0).unwrap()["count"],
            &Value::Int(3)
        );

        let none = Datasets::from_tables([(
            Dataset::PrimaryPerson,
            persons(&[(1, "MALE", "TX", "W", None)]),
        )]);
        assert_list(&top_female_state(&none).unwrap(), strings(&[]));
    }

    #[test]
    fn makes_ranked_sixth_to_fifteenth() {
        // make M<i> has i casualties, split over injuries and deaths
        let mut rows: Vec<Vec<(&str, Value)>> = (1..=20i64)
            .map(|i| {
                vec![
                    ("CRASH_ID", Value::Int(i)),
                    ("VEH_MAKE_ID", Value::from(format!("M{}", i))),
                    ("TOT_INJRY_CNT", Value::Int(i - 1)),
                    ("DEATH_CNT", Value::Int(1)),
                ]
            })
            .collect();
        rows.push(vec![
            ("CRASH_ID", Value::Int(99)),
            ("VEH_MAKE_ID", Value::from("NA")),
            ("TOT_INJRY_CNT", Value::Int(500)),
            ("DEATH_CNT", Value::Int(0)),
        ]);
        let data = Datasets::from_tables([(Dataset::Units, units(rows))]);

        let outcome = top_makes_by_casualties(&data).unwrap();
        let expected: Vec<String> = (6..=15).rev().map(|i| format!("M{}", i)).collect();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        assert_list(&outcome, strings(&expected));
        // every ranked make reaches the sink, not just the slice
        assert_eq!(outcome.output.num_rows(), 20);
        assert_eq!(
            outcome.output.column_values("TOT_CASUALTIES_CNT_AGG").unwrap(),
            (1..=20).rev().map(Value::Int).collect::<Vec<_>>()
        );
        assert_eq!(outcome.output.first_value("VEH_MAKE_ID").unwrap(), Some(Value::from("M20")));
    }

    #[test]
    fn top_ethnicity_per_body_style_skips_sentinels() {
        let data = Datasets::from_tables([
            (
                Dataset::Units,
                units(
                    [(1, "VAN"), (2, "VAN"), (3, "VAN"), (4, "NA"), (5, "SUV")]
                        .iter()
                        .map(|&(id, body)| {
                            vec![
                                ("CRASH_ID", Value::Int(id)),
                                ("VEH_BODY_STYL_ID", Value::from(body)),
                            ]
                        })
                        .collect(),
                ),
            ),
            (
                Dataset::PrimaryPerson,
                persons(&[
                    (1, "MALE", "TX", "HISPANIC", None),
                    (2, "MALE", "TX", "WHITE", None),
                    (3, "MALE", "TX", "WHITE", None),
                    (4, "MALE", "TX", "BLACK", None),
                    (5, "MALE", "TX", "UNKNOWN", None),
                ]),
            ),
        ]);

        let outcome = top_ethnicity_per_body_style(&data).unwrap();
        let t = &outcome.output;
        assert_eq!(
            t.schema().names().collect::<Vec<_>>(),
            vec!["VEH_BODY_STYL_ID", "PRSN_ETHNICITY_ID"]
        );
        assert_eq!(
            t.rows().to_vec(),
            vec![vec![Value::from("VAN"), Value::from("WHITE")]]
        );
        assert!(matches!(outcome.value, AnalysisValue::Table(_)));
    }

    #[test]
    fn alcohol_zip_codes_ignore_null_zips() {
        let unit_rows = [
            (1, Some("UNDER INFLUENCE - ALCOHOL"), None),
            (2, None, Some("HAD BEEN DRINKING - ALCOHOL")),
            (3, Some("SPEEDING"), None),
            (4, Some("UNDER INFLUENCE - ALCOHOL"), None),
        ];
        let data = Datasets::from_tables([
            (
                Dataset::Units,
                units(
                    unit_rows
                        .iter()
                        .map(|&(id, f1, f2): &(i64, Option<&str>, Option<&str>)| {
                            vec![
                                ("CRASH_ID", Value::Int(id)),
                                ("CONTRIB_FACTR_1_ID", Value::from(f1)),
                                ("CONTRIB_FACTR_2_ID", Value::from(f2)),
                            ]
                        })
                        .collect(),
                ),
            ),
            (
                Dataset::PrimaryPerson,
                persons(&[
                    (1, "MALE", "TX", "W", Some("76010")),
                    (2, "MALE", "TX", "W", Some("76010")),
                    (3, "MALE", "TX", "W", Some("75067")),
                    (4, "MALE", "TX", "W", None),
                ]),
            ),
        ]);

        let outcome = top_alcohol_zip_codes(&data).unwrap();
        assert_list(&outcome, strings(&["76010"]));
        assert_eq!(outcome.output.record(0).unwrap()["count"], &Value::Int(2));
    }

    fn damage_data(property: &str) -> Datasets {
        Datasets::from_tables([
            (
                Dataset::Damages,
                table(
                    "Damages",
                    &[
                        ("CRASH_ID", ColumnType::Integer),
                        ("DAMAGED_PROPERTY", ColumnType::Categorical),
                    ],
                    vec![vec![
                        ("CRASH_ID", Value::Int(1)),
                        ("DAMAGED_PROPERTY", Value::from(property)),
                    ]],
                ),
            ),
            (
                Dataset::Units,
                units(vec![
                    vec![
                        ("CRASH_ID", Value::Int(1)),
                        ("VEH_DMAG_SCL_1_ID", Value::from("DAMAGED 5")),
                        ("FIN_RESP_TYPE_ID", Value::from("LIABILITY INSURANCE POLICY")),
                    ],
                    vec![
                        ("CRASH_ID", Value::Int(1)),
                        ("VEH_DMAG_SCL_1_ID", Value::from("DAMAGED 6")),
                        ("FIN_RESP_TYPE_ID", Value::from("LIABILITY INSURANCE POLICY")),
                    ],
                ]),
            ),
        ])
    }

    #[test]
    fn insured_high_damage_crash_ids() {
        let outcome = insured_high_damage_crashes(&damage_data("NONE")).unwrap();
        assert_eq!(outcome.value.to_string(), "[1]");
        assert_eq!(outcome.output.num_rows(), 1);

        let outcome = insured_high_damage_crashes(&damage_data("SOME PROPERTY")).unwrap();
        assert_eq!(outcome.value.to_string(), "[]");
    }

    #[test]
    fn damage_sentinels_do_not_count_as_high_damage() {
        let data = Datasets::from_tables([
            (Dataset::Damages, damage_data("NONE").get(Dataset::Damages).unwrap().clone()),
            (
                Dataset::Units,
                units(vec![vec![
                    ("CRASH_ID", Value::Int(1)),
                    ("VEH_DMAG_SCL_1_ID", Value::from("NO DAMAGE")),
                    ("VEH_DMAG_SCL_2_ID", Value::from("DAMAGED 4")),
                    ("FIN_RESP_TYPE_ID", Value::from("PROOF OF LIABILITY INSURANCE")),
                ]]),
            ),
        ]);
        assert_eq!(insured_high_damage_crashes(&data).unwrap().value.to_string(), "[]");
    }

    #[test]
    fn speeding_makes_pass_the_whole_funnel() {
        let charges = table(
            "Charges",
            &[
                ("CRASH_ID", ColumnType::Integer),
                ("UNIT_NBR", ColumnType::Integer),
                ("CHARGE", ColumnType::String),
            ],
            [(1, "SPEEDING"), (2, "UNSAFE SPEED"), (3, "SPEEDING"), (4, "DWI"), (5, "SPEEDING")]
                .iter()
                .map(|&(id, charge)| {
                    vec![
                        ("CRASH_ID", Value::Int(id)),
                        ("UNIT_NBR", Value::Int(1)),
                        ("CHARGE", Value::from(charge)),
                    ]
                })
                .collect(),
        );
        let unit = |id: i64, make: &str, colour: &str, state: &str| {
            vec![
                ("CRASH_ID", Value::Int(id)),
                ("VEH_MAKE_ID", Value::from(make)),
                ("VEH_COLOR_ID", Value::from(colour)),
                ("VEH_LIC_STATE_ID", Value::from(state)),
            ]
        };
        let data = Datasets::from_tables([
            (Dataset::Charges, charges),
            (
                Dataset::PrimaryPerson,
                persons(&[
                    (1, "MALE", "TX", "W", None),
                    (2, "MALE", "TX", "W", None),
                    (3, "MALE", "TX", "W", None),
                    (4, "MALE", "TX", "W", None),
                    (5, "MALE", "TX", "W", None),
                ]),
            ),
            (
                Dataset::Units,
                units(vec![
                    unit(1, "FORD", "BLK", "TX"),
                    unit(2, "FORD", "WHI", "TX"),
                    unit(3, "KIA", "BLK", "CA"),
                    unit(4, "HONDA", "BLK", "TX"),
                    // numeric state codes are never selected
                    unit(5, "BMW", "BLK", "98"),
                    unit(6, "BMW", "NA", "98"),
                ]),
            ),
        ]);

        let outcome = top_speeding_makes(&data).unwrap();
        assert_list(&outcome, strings(&["FORD", "KIA"]));
        assert_eq!(outcome.output.record(0).unwrap()["count"], &Value::Int(2));
    }

    /// Two speeding crashes: 1 is a FORD, 2 a KIA. `filler` adds units on
    /// other crashes that only shape the colour and state frequencies.
    fn funnel_data(first: (&str, &str), second: (&str, &str), filler: Vec<(String, String)>) -> Datasets {
        let charges = table(
            "Charges",
            &[("CRASH_ID", ColumnType::Integer), ("CHARGE", ColumnType::String)],
            (1..=2i64)
                .map(|id| vec![("CRASH_ID", Value::Int(id)), ("CHARGE", Value::from("SPEEDING"))])
                .collect(),
        );
        let unit = |id: i64, make: &str, colour: &str, state: &str| {
            vec![
                ("CRASH_ID", Value::Int(id)),
                ("VEH_MAKE_ID", Value::from(make)),
                ("VEH_COLOR_ID", Value::from(colour)),
                ("VEH_LIC_STATE_ID", Value::from(state)),
            ]
        };
        let mut rows = vec![
            unit(1, "FORD", first.0, first.1),
            unit(2, "KIA", second.0, second.1),
        ];
        rows.extend(
            filler
                .iter()
                .enumerate()
                .map(|(i, (colour, state))| unit(100 + i as i64, "OTHER", colour.as_str(), state.as_str())),
        );
        Datasets::from_tables([
            (Dataset::Charges, charges),
            (
                Dataset::PrimaryPerson,
                persons(&[(1, "MALE", "TX", "W", None), (2, "MALE", "TX", "W", None)]),
            ),
            (Dataset::Units, units(rows)),
        ])
    }

    #[test]
    fn speeding_makes_outside_the_top_ten_colours_are_dropped() {
        // C0..C9 appear three times each, C10 only on the KIA
        let filler: Vec<(String, String)> = (0..10)
            .flat_map(|i| std::iter::repeat((format!("C{}", i), "TX".to_string())).take(3))
            .collect();
        let data = funnel_data(("C0", "TX"), ("C10", "TX"), filler);
        assert_list(&top_speeding_makes(&data).unwrap(), strings(&["FORD"]));
    }

    #[test]
    fn speeding_makes_outside_the_top_twenty_five_states_are_dropped() {
        // S00..S24 appear three times each, S25 only on the KIA
        let filler: Vec<(String, String)> = (0..25)
            .flat_map(|i| std::iter::repeat(("BLK".to_string(), format!("S{:02}", i))).take(3))
            .collect();
        let data = funnel_data(("BLK", "S00"), ("BLK", "S25"), filler);
        assert_list(&top_speeding_makes(&data).unwrap(), strings(&["FORD"]));
    }
}
