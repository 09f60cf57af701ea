/// degree level codes - no mapping to real degree names
pub static DEGREES: [&str; 5] = ["1", "2", "3", "4", "5"];

pub static SCHOOLS: [&str; 5] = [
    "University of Virginia",
    "William & Mary",
    "Virginia Tech",
    "George Mason University",
    "Virginia Commonwealth University",
];

pub static SEXES: [&str; 3] = ["M", "F", "X"];

/// row id = MULTIPLIER * zero based row counter
pub const MULTIPLIER: u64 = 3;
pub const ROW_COUNT: u64 = 10_000_000;
pub const YEAR: u32 = 2010;

#[test]
fn test_tables_have_distinct_values() {
    fn distinct(t: &[&str]) -> bool {
        let mut v = t.to_vec();
        v.sort();
        v.dedup();
        v.len() == t.len()
    }
    assert!(distinct(&DEGREES), "degrees repeat");
    assert!(distinct(&SCHOOLS), "schools repeat");
    assert!(distinct(&SEXES), "sexes repeat");
    for s in DEGREES.iter().chain(SCHOOLS.iter()).chain(SEXES.iter()) {
        assert!(!s.contains(','), "table value \"{}\" would break default csv output", s);
    }
}
