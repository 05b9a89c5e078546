use std::collections::BTreeSet;

use montoro::application::services::sample_page_indices;

#[test]
fn given_large_document_when_sampling_then_takes_first_and_last_ranges() {
    let pages = sample_page_indices(100, 40, 40);

    let expected: Vec<usize> = (0..40).chain(60..100).collect();
    assert_eq!(pages, expected);
}

#[test]
fn given_overlapping_ranges_when_sampling_then_no_page_appears_twice() {
    let pages = sample_page_indices(10, 8, 8);

    let unique: BTreeSet<usize> = pages.iter().copied().collect();
    assert_eq!(unique.len(), pages.len(), "duplicate pages in sample");
    assert_eq!(pages, (0..10).collect::<Vec<usize>>());
}

#[test]
fn given_requests_larger_than_document_when_sampling_then_clamps_to_page_count() {
    let pages = sample_page_indices(5, 100, 100);

    assert_eq!(pages, vec![0, 1, 2, 3, 4]);
}

#[test]
fn given_zero_page_document_when_sampling_then_sample_is_empty() {
    assert!(sample_page_indices(0, 40, 40).is_empty());
}

#[test]
fn given_zero_take_counts_when_sampling_then_sample_is_empty() {
    assert!(sample_page_indices(50, 0, 0).is_empty());
}

#[test]
fn given_only_last_pages_requested_when_sampling_then_takes_document_tail() {
    assert_eq!(sample_page_indices(10, 0, 3), vec![7, 8, 9]);
}

#[test]
fn given_any_combination_when_sampling_then_pages_are_sorted_and_bounded() {
    for total in [0usize, 1, 7, 80, 200] {
        for first in [0usize, 1, 40, 250] {
            for last in [0usize, 1, 40, 250] {
                let pages = sample_page_indices(total, first, last);

                assert!(pages.len() <= total);
                assert!(pages.windows(2).all(|w| w[0] < w[1]));
                assert!(pages.iter().all(|&p| p < total));
            }
        }
    }
}
