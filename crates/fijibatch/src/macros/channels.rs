use crate::error::ValidationError;

/// Parameter names understood as channel selection for loop generation.
pub const CHANNEL_ALIASES: &[&str] = &["channels", "channel", "apply_channels", "target_channels"];

/// Parses a channel specification into an explicit channel list.
///
/// Accepts single integers, lists separated by whitespace/comma/semicolon,
/// and inclusive `start-end` ranges. A descending range expands descending.
pub fn parse_channel_spec(spec: &str) -> Result<Vec<i64>, ValidationError> {
    let mut channels = Vec::new();

    let tokens = spec
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    for token in tokens {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_int(spec, start)?;
                let end = parse_int(spec, end)?;
                if start <= end {
                    channels.extend(start..=end);
                } else {
                    channels.extend((end..=start).rev());
                }
            }
            None => channels.push(parse_int(spec, token)?),
        }
    }

    Ok(channels)
}

fn parse_int(spec: &str, token: &str) -> Result<i64, ValidationError> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::ChannelSpec {
            spec: spec.to_string(),
            token: token.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel() {
        assert_eq!(parse_channel_spec("3").unwrap(), vec![3]);
    }

    #[test]
    fn test_comma_separated_list() {
        assert_eq!(parse_channel_spec("1, 3").unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_semicolon_and_whitespace_separators() {
        assert_eq!(parse_channel_spec("1;2 4").unwrap(), vec![1, 2, 4]);
    }

    #[test]
    fn test_ascending_range() {
        assert_eq!(parse_channel_spec("2-4").unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn test_descending_range() {
        assert_eq!(parse_channel_spec("4-2").unwrap(), vec![4, 3, 2]);
    }

    #[test]
    fn test_mixed_tokens() {
        assert_eq!(parse_channel_spec("1, 3-5, 8").unwrap(), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_empty_spec_yields_empty_list() {
        assert_eq!(parse_channel_spec("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_channel_spec("  , ;").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_unparseable_scalar() {
        let err = parse_channel_spec("1, two").unwrap_err();
        match err {
            ValidationError::ChannelSpec { token, .. } => assert_eq!(token, "two"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_range_bound() {
        let err = parse_channel_spec("1-end").unwrap_err();
        match err {
            ValidationError::ChannelSpec { token, .. } => assert_eq!(token, "end"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
