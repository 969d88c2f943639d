//! 核心宏定义

/// 为配置类结构体实现 `Default` 的宏
///
/// 使用示例:
/// ```rust
/// use fx_engine::impl_default;
///
/// struct Burst {
///     count: u32,
///     frequency: f32,
/// }
///
/// impl_default!(Burst {
///     count: 20,
///     frequency: 0.1,
/// });
///
/// assert_eq!(Burst::default().count, 20);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    struct Ranges {
        min: f32,
        max: f32,
        label: String,
    }

    impl_default!(Ranges {
        min: -1.0,
        max: 1.0,
        label: "velocity".to_string(),
    });

    #[test]
    fn test_impl_default() {
        let r = Ranges::default();
        assert_eq!(r.min, -1.0);
        assert_eq!(r.max, 1.0);
        assert_eq!(r.label, "velocity");
    }
}
