//! Natural string ordering.
//!
//! Orders strings the way a human reading page numbers expects: maximal digit
//! runs compare as integers (`page2` before `page10`), everything else by
//! Unicode code point.

use std::cmp::Ordering;

/// Compare two strings in natural order.
///
/// Digit runs are compared numerically with leading zeros ignored; when two
/// runs have the same value, the longer (more padded) run sorts first. All
/// other characters compare by code point. Total order: reflexive,
/// antisymmetric and transitive, so it is safe as a sort comparator.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut i = 0;
    let mut j = 0;

    loop {
        match (a.get(i), b.get(j)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&ca), Some(&cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let end_a = digit_run_end(&a, i);
                    let end_b = digit_run_end(&b, j);
                    match compare_runs(&a[i..end_a], &b[j..end_b]) {
                        Ordering::Equal => {
                            i = end_a;
                            j = end_b;
                        }
                        other => return other,
                    }
                } else {
                    match ca.cmp(&cb) {
                        Ordering::Equal => {
                            i += 1;
                            j += 1;
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Compare two digit runs numerically, ties broken by longer run first.
fn compare_runs(a: &[char], b: &[char]) -> Ordering {
    let sig_a = &a[leading_zeros(a)..];
    let sig_b = &b[leading_zeros(b)..];

    // More significant digits means a bigger number.
    match sig_a.len().cmp(&sig_b.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    match sig_a.cmp(sig_b) {
        Ordering::Equal => {}
        other => return other,
    }
    // Same value: "007" sorts before "7".
    b.len().cmp(&a.len())
}

fn leading_zeros(run: &[char]) -> usize {
    let zeros = run.iter().take_while(|c| **c == '0').count();
    // Keep one digit so "0" and "000" stay comparable as value zero.
    zeros.min(run.len().saturating_sub(1))
}
