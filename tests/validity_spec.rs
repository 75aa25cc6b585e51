use calib_reader::{Error, ValidityKey, ValidityRange};

const U: u32 = 0; // unset bound

fn r(from: u32, to: u32) -> ValidityRange<u32> {
    ValidityRange::new(from, to)
}

#[test]
fn full_open_range_spans_everywhere() {
    assert!(r(U, U).is_non_empty());
    assert!(r(U, U).contains(1));
    assert!(r(U, U).contains(u32::MAX));
}

#[test]
fn half_open_ranges_are_non_empty() {
    assert!(r(1, U).is_non_empty());
    assert!(r(U, 1).is_non_empty());
}

#[test]
fn closed_range_is_non_empty() {
    assert!(r(5, 10).is_non_empty());
}

#[test]
fn degenerate_and_inverted_ranges_are_empty() {
    assert!(!r(10, 10).is_non_empty());
    assert!(!r(11, 10).is_non_empty());
}

#[test]
fn contains_is_half_open() {
    let range = r(10, 20);
    assert!(!range.contains(9));
    assert!(range.contains(10));
    assert!(range.contains(19));
    assert!(!range.contains(20));
    assert!(!range.contains(25));

    let open_end = r(10, U);
    assert!(open_end.contains(10));
    assert!(open_end.contains(u32::MAX));
    assert!(!open_end.contains(9));
}

#[test]
fn intersection_matrix() {
    struct Case {
        v: [ValidityRange<u32>; 2],
        result: ValidityRange<u32>,
        non_empty: bool,
    }
    let cases = [
        // Intersection with full open range
        Case { v: [r(U, U), r(U, U)], result: r(U, U), non_empty: true },   // #0
        Case { v: [r(U, 10), r(U, U)], result: r(U, 10), non_empty: true }, // #1
        Case { v: [r(10, U), r(U, U)], result: r(10, U), non_empty: true }, // #2
        Case { v: [r(10, 10), r(U, U)], result: r(10, 10), non_empty: false }, // #3
        Case { v: [r(10, 20), r(U, U)], result: r(10, 20), non_empty: true },  // #4
        Case { v: [r(20, 10), r(U, U)], result: r(20, 10), non_empty: false }, // #5
        // Intersection with semi-open range, edge cases, right bound
        Case { v: [r(U, U), r(U, 10)], result: r(U, 10), non_empty: true },    // #6
        Case { v: [r(U, 10), r(U, 10)], result: r(U, 10), non_empty: true },   // #7
        Case { v: [r(10, U), r(U, 10)], result: r(10, 10), non_empty: false }, // #8
        Case { v: [r(10, 10), r(U, 10)], result: r(10, 10), non_empty: false }, // #9
        Case { v: [r(10, 20), r(U, 10)], result: r(10, 10), non_empty: false }, // #10
        Case { v: [r(20, 10), r(U, 10)], result: r(20, 10), non_empty: false }, // #11
        // Intersection with semi-open range, edge cases, left bound
        Case { v: [r(U, U), r(10, U)], result: r(10, U), non_empty: true },    // #12
        Case { v: [r(U, 10), r(10, U)], result: r(10, 10), non_empty: false }, // #13
        Case { v: [r(10, U), r(10, U)], result: r(10, U), non_empty: true },   // #14
        Case { v: [r(10, 10), r(10, U)], result: r(10, 10), non_empty: false }, // #15
        Case { v: [r(10, 20), r(10, U)], result: r(10, 20), non_empty: true },  // #16
        Case { v: [r(20, 10), r(10, U)], result: r(20, 10), non_empty: false }, // #17
        // Intersection with semi-open range, right bound
        Case { v: [r(U, U), r(U, 15)], result: r(U, 15), non_empty: true },    // #18
        Case { v: [r(U, 10), r(U, 15)], result: r(U, 10), non_empty: true },   // #19
        Case { v: [r(10, U), r(U, 15)], result: r(10, 15), non_empty: true },  // #20
        Case { v: [r(10, 10), r(U, 15)], result: r(10, 10), non_empty: false }, // #21
        Case { v: [r(10, 20), r(U, 15)], result: r(10, 15), non_empty: true },  // #22
        Case { v: [r(20, 10), r(U, 15)], result: r(20, 10), non_empty: false }, // #23
        // Intersection with semi-open range, left bound
        Case { v: [r(U, U), r(15, U)], result: r(15, U), non_empty: true },    // #24
        Case { v: [r(U, 10), r(15, U)], result: r(15, 10), non_empty: false }, // #25
        Case { v: [r(10, U), r(15, U)], result: r(15, U), non_empty: true },   // #26
        Case { v: [r(10, 10), r(15, U)], result: r(15, 10), non_empty: false }, // #27
        Case { v: [r(10, 20), r(15, U)], result: r(15, 20), non_empty: true },  // #28
        Case { v: [r(20, 10), r(15, U)], result: r(20, 10), non_empty: false }, // #29
        // Fully set intersections
        Case { v: [r(10, 20), r(10, 20)], result: r(10, 20), non_empty: true }, // #30
        Case { v: [r(12, 18), r(10, 20)], result: r(12, 18), non_empty: true }, // #31
        Case { v: [r(10, 18), r(12, 20)], result: r(12, 18), non_empty: true }, // #32
        Case { v: [r(10, 15), r(15, 20)], result: r(15, 15), non_empty: false }, // #33
        Case { v: [r(10, 12), r(18, 20)], result: r(18, 12), non_empty: false }, // #34
    ];

    for (i, case) in cases.iter().enumerate() {
        for order in 0..2 {
            let got = if order == 0 {
                case.v[0] & case.v[1]
            } else {
                case.v[1] & case.v[0]
            };
            assert_eq!(got, case.result, "case #{i} order={order}");
            assert_eq!(got.is_non_empty(), case.non_empty, "case #{i} order={order}");
        }
    }
}

#[test]
fn nonempty_intersection_shares_a_key() {
    // When the intersection is non-empty, both inputs contain its start.
    let a = r(10, 18);
    let b = r(12, 20);
    let both = a & b;
    assert!(both.is_non_empty());
    assert!(a.contains(both.from) && b.contains(both.from));
}

#[test]
fn parses_closed_range_advancing_upper_bound() {
    let range = ValidityRange::<u32>::parse("100-500").unwrap();
    assert_eq!(range, r(100, 501));
}

#[test]
fn parses_open_ended_range() {
    let range = ValidityRange::<u32>::parse("500-...").unwrap();
    assert_eq!(range, r(500, U));
}

#[test]
fn parses_bare_value_as_singleton() {
    let range = ValidityRange::<u32>::parse("100").unwrap();
    assert_eq!(range, r(100, 101));
}

#[test]
fn parses_with_surrounding_spaces() {
    let range = ValidityRange::<u32>::parse(" 100 - 500 ").unwrap();
    assert_eq!(range, r(100, 501));
}

#[test]
fn rejects_left_open_lexical_form() {
    assert!(matches!(
        ValidityRange::<u32>::parse("...-10"),
        Err(Error::Parse { .. })
    ));
    assert!(matches!(
        ValidityRange::<u32>::parse("..."),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn rejects_garbage_bounds() {
    assert!(matches!(
        ValidityRange::<u32>::parse("abc-5"),
        Err(Error::Parse { .. })
    ));
    assert!(matches!(
        ValidityRange::<u32>::parse("5-abc"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn left_open_range_exists_programmatically() {
    // The lexical form forbids an open start, the constructor does not.
    let range = r(U, 10);
    assert!(range.is_non_empty());
    assert!(range.contains(3));
    assert!(!range.contains(10));
}

#[test]
fn display_uses_ellipsis_for_unset_bounds() {
    assert_eq!(r(100, 501).to_string(), "100-501");
    assert_eq!(r(500, U).to_string(), "500-...");
    assert_eq!(r(U, U).to_string(), "...-...");
}

#[test]
fn textual_round_trip_advances_upper_bound_once_more() {
    // Re-serializing stores the already-advanced exclusive bound, so a
    // second parse advances once again.
    let parsed = ValidityRange::<u32>::parse("100-500").unwrap();
    assert_eq!(parsed.to_string(), "100-501");
    let reparsed = ValidityRange::<u32>::parse(&parsed.to_string()).unwrap();
    assert_eq!(reparsed, r(100, 502));
}

#[test]
fn key_advance_and_text_round_trip() {
    assert_eq!(7u32.advance(), 8);
    assert_eq!(u32::from_text(" 42 ").unwrap(), 42);
    assert_eq!(42u32.to_text(), "42");
    assert!(u32::from_text("x").is_err());
    assert!(!0u32.is_set());
    assert!(1u32.is_set());
}
