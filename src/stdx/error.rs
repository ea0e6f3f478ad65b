use thiserror::Error;

macro_rules! assumption {
    ($msg:literal $(, $args:expr)* ) => {{
        return Err($crate::stdx::error::ParseError::from( format!($msg $(, $args)*)).into());
    }};
    ($cond:expr, $msg:literal $(, $args:expr)* ) => {{
        if !$cond {
        return Err($crate::stdx::error::ParseError::from( format!("`{}`, {}", stringify!($cond), format!($msg $(, $args)*))).into());
        }
    }};
}

pub(crate) use assumption;

/// The markup of a page did not have the shape the crawler depends on.
///
/// The crawler reads elements from fixed positions on `comic.naver.com` pages.
/// If an expected element or attribute is missing, this is returned with a
/// message naming what was looked for.
///
/// A stale cache file can also cause this: deleting the file forces a refetch
/// on the next call.
#[derive(Debug, Error)]
#[error("unexpected page structure: {0}")]
pub struct ParseError(String);

impl From<String> for ParseError {
    #[inline]
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

impl From<&str> for ParseError {
    #[inline]
    fn from(msg: &str) -> Self {
        Self(msg.to_owned())
    }
}

pub(crate) trait Assume<T> {
    type Output;

    fn assumption(self, msg: impl Into<String>) -> Self::Output;
}

impl<T> Assume<T> for Option<T> {
    type Output = Result<T, ParseError>;

    #[inline]
    fn assumption(self, msg: impl Into<String>) -> Self::Output {
        self.ok_or_else(|| ParseError(msg.into()))
    }
}

impl<T, E> Assume<T> for Result<T, E> {
    type Output = Result<T, ParseError>;

    #[inline]
    fn assumption(self, msg: impl Into<String>) -> Self::Output {
        self.map_err(|_err: _| ParseError(msg.into()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_bail_with_message() {
        fn bail() -> Result<(), ParseError> {
            assumption!("`div.detail` is missing on the series page");
        }

        let err = bail().unwrap_err();
        pretty_assertions::assert_eq!(
            "unexpected page structure: `div.detail` is missing on the series page",
            err.to_string()
        );
    }

    #[test]
    fn should_bail_on_condition_fail_with_message() {
        fn bail(rows: &[()]) -> Result<(), ParseError> {
            assumption!(
                !rows.is_empty(),
                "episode rows should not be empty, but was {}",
                rows.len()
            );
            Ok(())
        }

        assert!(bail(&[()]).is_ok(), "non-empty rows should pass");

        let err = bail(&[]).unwrap_err();
        pretty_assertions::assert_eq!(
            "unexpected page structure: `!rows.is_empty()`, episode rows should not be empty, but was 0",
            err.to_string()
        );
    }

    #[test]
    fn should_error_on_missing_option() {
        let missing: Option<()> = None;
        let err = missing
            .assumption("failed to find `div.thumb > a > img` on the listing page")
            .unwrap_err();

        assert!(
            err.to_string().contains("div.thumb > a > img"),
            "message should name the missing element"
        );
    }

    #[test]
    fn should_error_on_failed_result() {
        let number: Result<u32, _> = "abc".parse::<u32>();
        let err = number
            .assumption(format!("episode number `{}` should be numeric", "abc"))
            .unwrap_err();

        pretty_assertions::assert_eq!(
            "unexpected page structure: episode number `abc` should be numeric",
            err.to_string()
        );
    }
}
