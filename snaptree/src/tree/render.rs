//! Canonical text rendering of trees.
//!
//! A tree renders as `(k1=v1,k2=v2,...)` in key order. A value that is the
//! very same object as its key (an `Arc` or reference to the same
//! allocation) is written once, without `=value`; merely equal values are
//! always written out. The empty tree renders as the empty string.
//!
//! `i64` keys are engine identifiers and render through [`uid`], which marks
//! the four reserved ranges with a one-character prefix.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::tree::multi::MultiTree;
use crate::tree::tree::Tree;

const RANGE_PERCENT: i64 = 0x7000_0000_0000_0000;
const RANGE_BACKTICK: i64 = 0x6000_0000_0000_0000;
const RANGE_HASH: i64 = 0x5000_0000_0000_0000;
const RANGE_BANG: i64 = 0x4000_0000_0000_0000;

/// Render an engine identifier.
///
/// Values in a reserved range are written as a prefix and the offset into
/// that range; `-1` is written as `_`.
#[must_use]
pub fn uid(u: i64) -> String {
    if u >= RANGE_PERCENT {
        return format!("%{}", u - RANGE_PERCENT);
    }
    if u >= RANGE_BACKTICK {
        return format!("`{}", u - RANGE_BACKTICK);
    }
    if u >= RANGE_HASH {
        return format!("#{}", u - RANGE_HASH);
    }
    if u >= RANGE_BANG {
        return format!("!{}", u - RANGE_BANG);
    }
    if u == -1 {
        return "_".to_string();
    }
    u.to_string()
}

/// How a key is written in a tree's rendering.
pub trait RenderKey {
    fn render_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Check whether `other` is this very object, not just an equal one.
    ///
    /// Plain values are never identical to each other.
    fn is_same_object(&self, other: &Self) -> bool {
        let _ = other;
        false
    }
}

impl RenderKey for i64 {
    fn render_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uid(*self))
    }
}

macro_rules! render_with_display {
    ($($t:ty),* $(,)?) => {
        $(
            impl RenderKey for $t {
                fn render_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{self}")
                }
            }
        )*
    };
}

render_with_display!(
    i8, i16, i32, i128, isize, u8, u16, u32, u64, u128, usize, char, bool, str, String,
);

impl<T: RenderKey + ?Sized> RenderKey for &T {
    fn render_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).render_key(f)
    }

    fn is_same_object(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

impl<T: RenderKey + ?Sized> RenderKey for Arc<T> {
    fn render_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).render_key(f)
    }

    fn is_same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Check whether `value` is the same object as `key`.
fn is_own_key<K: RenderKey + 'static, V: 'static>(key: &K, value: &V) -> bool {
    (value as &dyn Any)
        .downcast_ref::<K>()
        .is_some_and(|v| key.is_same_object(v))
}

impl<K, V, O> fmt::Display for Tree<K, V, O>
where
    K: RenderKey + 'static,
    V: fmt::Display + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = '(';
        for (key, value) in self {
            write!(f, "{sep}")?;
            sep = ',';
            key.render_key(f)?;
            if !is_own_key(key, value) {
                write!(f, "={value}")?;
            }
        }
        if sep == ',' {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl<K, V, O> fmt::Display for MultiTree<K, V, O>
where
    K: RenderKey,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = '(';
        for (key, values) in self.groups() {
            write!(f, "{sep}")?;
            sep = ',';
            key.render_key(f)?;
            let mut inner = '(';
            write!(f, "=")?;
            for (value, ()) in values {
                write!(f, "{inner}{value}")?;
                inner = ',';
            }
            write!(f, ")")?;
        }
        if sep == ',' {
            write!(f, ")")?;
        }
        Ok(())
    }
}
