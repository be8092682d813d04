//! Macros.

/// Wraps a `usize` in a zero-cost index type, with a total map.
///
/// Generates the index structure itself and a wrapper around `Vec` indexed
/// by it.
macro_rules! wrap_usize {
    (
        $(#[$meta:meta])* $name:ident
        $(#[$map_meta:meta])* map: $map:ident
    ) => (
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default
        )]
        pub struct $name {
            val: usize,
        }
        impl $name {
            /// Index zero.
            #[inline]
            pub fn zero() -> Self {
                $name { val: 0 }
            }
            /// Wrapped value.
            #[inline]
            pub fn get(self) -> usize {
                self.val
            }
            /// Increments the index.
            #[inline]
            pub fn inc(&mut self) {
                self.val += 1
            }
        }
        impl From<usize> for $name {
            fn from(val: usize) -> Self {
                $name { val }
            }
        }
        impl From<$name> for usize {
            fn from(idx: $name) -> usize {
                idx.val
            }
        }
        impl ::std::ops::Deref for $name {
            type Target = usize;
            fn deref(&self) -> &usize {
                &self.val
            }
        }
        impl ::std::fmt::Display for $name {
            fn fmt(&self, fmt: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(fmt, "{}", self.val)
            }
        }

        $(#[$map_meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $map<T> {
            vec: Vec<T>,
        }
        impl<T> $map<T> {
            /// Empty map.
            #[inline]
            pub fn new() -> Self {
                $map { vec: Vec::new() }
            }
            /// Empty map with some capacity.
            #[inline]
            pub fn with_capacity(capa: usize) -> Self {
                $map { vec: Vec::with_capacity(capa) }
            }
            /// Number of elements.
            #[inline]
            pub fn len(&self) -> usize {
                self.vec.len()
            }
            /// True if the map is empty.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.vec.is_empty()
            }
            /// Index the next `push` will use.
            #[inline]
            pub fn next_index(&self) -> $name {
                self.vec.len().into()
            }
            /// Pushes an element, yields its index.
            #[inline]
            pub fn push(&mut self, elem: T) -> $name {
                let idx = self.next_index();
                self.vec.push(elem);
                idx
            }
            /// Iterator over the elements.
            #[inline]
            pub fn iter(&self) -> ::std::slice::Iter<T> {
                self.vec.iter()
            }
            /// Mutable iterator over the elements.
            #[inline]
            pub fn iter_mut(&mut self) -> ::std::slice::IterMut<T> {
                self.vec.iter_mut()
            }
            /// Iterator over indices and elements.
            #[inline]
            pub fn index_iter(&self) -> impl Iterator<Item = ($name, &T)> {
                self.vec.iter().enumerate().map(|(idx, elem)| (idx.into(), elem))
            }
        }
        impl<T> Default for $map<T> {
            fn default() -> Self {
                Self::new()
            }
        }
        impl<T> From<Vec<T>> for $map<T> {
            fn from(vec: Vec<T>) -> Self {
                $map { vec }
            }
        }
        impl<T> ::std::ops::Index<$name> for $map<T> {
            type Output = T;
            fn index(&self, idx: $name) -> &T {
                &self.vec[idx.val]
            }
        }
        impl<T> ::std::ops::IndexMut<$name> for $map<T> {
            fn index_mut(&mut self, idx: $name) -> &mut T {
                &mut self.vec[idx.val]
            }
        }
        impl<'a, T> IntoIterator for &'a $map<T> {
            type Item = &'a T;
            type IntoIter = ::std::slice::Iter<'a, T>;
            fn into_iter(self) -> Self::IntoIter {
                self.vec.iter()
            }
        }
        impl<T> IntoIterator for $map<T> {
            type Item = T;
            type IntoIter = ::std::vec::IntoIter<T>;
            fn into_iter(self) -> Self::IntoIter {
                self.vec.into_iter()
            }
        }
    );
}

/// Logs at verbose level. Inactive in bench mode.
#[cfg(not(feature = "bench"))]
macro_rules! log_info {
    ($($tt:tt)*) => {
        if conf.verbose() {
            println!("; {}", format!($($tt)*))
        }
    };
}
#[cfg(feature = "bench")]
macro_rules! log_info {
    ($($tt:tt)*) => {
        ()
    };
}

/// Logs at debug level. Inactive in bench mode.
#[cfg(not(feature = "bench"))]
macro_rules! log_debug {
    ($($tt:tt)*) => {
        if conf.debug() {
            println!("; {}", format!($($tt)*))
        }
    };
}
#[cfg(feature = "bench")]
macro_rules! log_debug {
    ($($tt:tt)*) => {
        ()
    };
}

/// Solver diagnostics, gated by a stats level.
///
/// Takes the sub-configuration carrying the level, the minimal level at
/// which the message is emitted, and a format string.
#[cfg(not(feature = "bench"))]
macro_rules! slog {
    ($conf:expr, $lvl:expr => $($tail:tt)*) => {
        if $conf.stats_level >= $lvl {
            println!("; {}", format!($($tail)*))
        }
    };
}
#[cfg(feature = "bench")]
macro_rules! slog {
    ($conf:expr, $lvl:expr => $($tail:tt)*) => {
        ()
    };
}

/// Profiling macro.
///
/// If passed `self`, assumes `self` has a `_profiler` field.
#[cfg(not(feature = "bench"))]
macro_rules! profile {
    ( |$prof:ident| $stat:expr => add $e:expr ) => {
        $prof.stat_do($stat, |val| val + $e)
    };
    ( |$prof:ident| $meth:ident $scope:expr ) => {
        $prof.$meth($scope)
    };
    ( $slf:ident $stat:expr => add $e:expr ) => {{
        let prof = &$slf._profiler;
        profile! { |prof| $stat => add $e }
    }};
    ( $slf:ident $meth:ident $scope:expr ) => {{
        let prof = &$slf._profiler;
        profile! { |prof| $meth $scope }
    }};
}
#[cfg(feature = "bench")]
macro_rules! profile {
    ( $($tt:tt)* ) => {
        ()
    };
}

/// Builds a variable-to-value map for evaluation.
///
/// Test helper.
#[cfg(test)]
macro_rules! model {
    () => {
        $crate::common::VarMap::<$crate::val::Val>::new()
    };
    ( $($val:expr),* $(,)? ) => {{
        let mut model = $crate::common::VarMap::new();
        $(
            model.push($val);
        )*
        model
    }};
}

/// Evaluates a term against a model and checks the result.
///
/// Test helper.
#[cfg(test)]
macro_rules! assert_eval {
    ( int $model:expr => $term:expr, $value:expr ) => {{
        let res = $term
            .eval(&$model)
            .expect("evaluation failed");
        assert_eq!(res, $crate::val::int($value))
    }};
    ( bool $model:expr => $term:expr ) => {{
        let res = $term
            .eval(&$model)
            .expect("evaluation failed");
        assert_eq!(res, $crate::val::bool(true))
    }};
    ( bool not $model:expr => $term:expr ) => {{
        let res = $term
            .eval(&$model)
            .expect("evaluation failed");
        assert_eq!(res, $crate::val::bool(false))
    }};
}
