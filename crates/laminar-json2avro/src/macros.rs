/// Generates `Display` and `FromStr` impls for simple string enums used in
/// converter properties.
///
/// `str_enum!(Enum, "config.key", Variant => "canonical", "alias"; ...)`
///
/// Parsing lowercases the input and maps `-` to `_` before matching, so
/// `"Omit"`, `"omit"` and `"OMIT"` are equivalent. Unrecognized values
/// produce [`ConversionError::InvalidConfig`](crate::error::ConversionError)
/// naming `config.key`.
macro_rules! str_enum {
    ($enum_name:ident, $key:literal,
        $( $variant:ident => $display:literal $(, $alias:literal)* );+ $(;)?
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $( Self::$variant => $display, )+
                };
                f.write_str(s)
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = crate::error::ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $( $display $(| $alias)* => Ok(Self::$variant), )+
                    other => Err(crate::error::ConversionError::InvalidConfig {
                        key: $key.into(),
                        message: format!("unrecognized value '{other}'"),
                    }),
                }
            }
        }
    };
}
