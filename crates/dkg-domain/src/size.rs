use thiserror::Error;

/// Size of one storage chunk in bytes.
pub const CHUNK_BYTE_SIZE: usize = 32;

/// Default ceiling on a dataset's byte size (10 MiB).
pub const DEFAULT_MAX_DATASET_BYTE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Dataset size {size} bytes exceeds the maximum of {max} bytes")]
pub struct SizeLimitExceeded {
    pub size: usize,
    pub max: usize,
}

/// UTF-8 byte length of the statements joined with `\n`.
pub fn calculate_byte_size(statements: &[String]) -> usize {
    if statements.is_empty() {
        return 0;
    }
    let separators = statements.len() - 1;
    statements.iter().map(String::len).sum::<usize>() + separators
}

/// Smallest number of `chunk_byte_size` chunks that holds the dataset.
pub fn calculate_chunk_count(statements: &[String], chunk_byte_size: usize) -> usize {
    calculate_byte_size(statements).div_ceil(chunk_byte_size.max(1))
}

/// Size the ledger records for a dataset: whole chunks, so always a multiple
/// of `chunk_byte_size`. Nodes recompute this value before confirming finality.
pub fn calculate_assertion_size(statements: &[String], chunk_byte_size: usize) -> usize {
    calculate_chunk_count(statements, chunk_byte_size) * chunk_byte_size.max(1)
}

/// Returns the byte size, or an error if it exceeds `max`.
pub fn ensure_within_size_limit(
    statements: &[String],
    max: usize,
) -> Result<usize, SizeLimitExceeded> {
    let size = calculate_byte_size(statements);
    if size > max {
        return Err(SizeLimitExceeded { size, max });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_byte_size_matches_joined_length() {
        let set = statements(&["<a> <b> <c> .", "<a> <b> \"ž\" ."]);
        assert_eq!(calculate_byte_size(&set), set.join("\n").len());
        assert_eq!(calculate_byte_size(&[]), 0);
    }

    #[test]
    fn test_chunk_count_is_minimal_cover() {
        for line in ["", "x", "<a> <b> <c> .", &"y".repeat(32), &"z".repeat(33)] {
            let set = statements(&[line, "<a> <b> <d> ."]);
            let size = calculate_byte_size(&set);
            let chunks = calculate_chunk_count(&set, CHUNK_BYTE_SIZE);
            assert!(chunks * CHUNK_BYTE_SIZE >= size);
            assert!(chunks == 0 || (chunks - 1) * CHUNK_BYTE_SIZE < size);
        }
    }

    #[test]
    fn test_assertion_size_rounds_up_to_whole_chunks() {
        let set = statements(&["<a> <b> <d> .", "<a> <b> <c> ."]);
        assert_eq!(calculate_byte_size(&set), 27);
        assert_eq!(calculate_assertion_size(&set, CHUNK_BYTE_SIZE), 32);

        let exact = statements(&[&"x".repeat(64)]);
        assert_eq!(calculate_assertion_size(&exact, CHUNK_BYTE_SIZE), 64);
        assert_eq!(calculate_assertion_size(&[], CHUNK_BYTE_SIZE), 0);
    }

    #[test]
    fn test_size_limit() {
        let set = statements(&["0123456789"]);
        assert_eq!(ensure_within_size_limit(&set, 10), Ok(10));
        assert_eq!(
            ensure_within_size_limit(&set, 9),
            Err(SizeLimitExceeded { size: 10, max: 9 })
        );
    }
}
