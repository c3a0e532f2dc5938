use crate::variable::VarKind;

pub type LuxelResult<T> = Result<T, LuxelError>;

#[derive(thiserror::Error, Debug)]
pub enum LuxelError {
    #[error("pixel ({x}, {y}) is out of bounds for {width}x{height} canvas")]
    Bounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("variable '{0}' is not registered")]
    VariableNotFound(String),

    #[error("variable '{0}' is already registered")]
    DuplicateVariable(String),

    #[error("variable '{name}' holds {found}, requested {expected}")]
    VariableTypeMismatch {
        name: String,
        expected: VarKind,
        found: VarKind,
    },

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("render loop is already running")]
    AlreadyRunning,

    #[error("render loop is not running")]
    NotRunning,

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LuxelError {
    pub fn bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::Bounds {
            x,
            y,
            width,
            height,
        }
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LuxelError::conversion("x")
                .to_string()
                .contains("conversion error:")
        );
        assert!(LuxelError::script("x").to_string().contains("script error:"));
        assert!(
            LuxelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            LuxelError::VariableNotFound("hue".into())
                .to_string()
                .contains("'hue'")
        );
    }

    #[test]
    fn bounds_names_the_offending_coordinate() {
        let err = LuxelError::bounds(4, 1, 4, 2);
        let msg = err.to_string();
        assert!(msg.contains("(4, 1)"));
        assert!(msg.contains("4x2"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = LuxelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
