use anyhow::{Context, Result};
use std::fmt;
use std::marker::PhantomData;

/// A stateless step that turns an input of type `I` into an output of type `O`.
///
/// Image transforms (`DynamicImage -> DynamicImage`) and target transforms
/// (`usize -> usize`) both implement this trait. Steps compose with
/// [`Transform::then`], which checks at compile time that the output of one
/// step is the input of the next.
///
/// `describe` feeds the dataset summary. The default is the bare type name;
/// transforms with parameters should override it.
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    /// Human-readable representation used by dataset summaries.
    fn describe(&self) -> String {
        short_type_name::<Self>().to_string()
    }

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// Strips the module path (and any generic arguments) from a type name.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

/// A chain of two transforms (`A` -> `B`) sharing the intermediate type `M`.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Use [`Transform::then`] for better ergonomics; `new` is handy when the
    /// pipeline is assembled from configuration.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        self.first
            .apply(input)
            .and_then(|mid| self.second.apply(mid))
            .with_context(|| {
                format!(
                    "Transform chain failed: {} → {}",
                    Transform::<I, M>::describe(&self.first),
                    Transform::<M, O>::describe(&self.second)
                )
            })
    }

    /// Nested chains flatten into one `Compose(...)` block, one step per line.
    fn describe(&self) -> String {
        let mut steps = Vec::new();
        for part in [
            Transform::<I, M>::describe(&self.first),
            Transform::<M, O>::describe(&self.second),
        ] {
            match part
                .strip_prefix("Compose(\n")
                .and_then(|rest| rest.strip_suffix("\n)"))
            {
                Some(inner) => steps.extend(inner.lines().map(|l| l.trim_start().to_string())),
                None => steps.push(part),
            }
        }
        let body: Vec<String> = steps.iter().map(|s| format!("    {}", s)).collect();
        format!("Compose(\n{}\n)", body.join("\n"))
    }
}

/// Wraps a closure as a named transform.
///
/// ```ignore
/// let to_binary = FnTransform::new("IsPositive", |class: usize| -> Result<usize> {
///     Ok(usize::from(class > 0))
/// });
/// ```
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<I, O, F> Transform<I, O> for FnTransform<F>
where
    F: Fn(I) -> Result<O> + Send + Sync,
{
    fn apply(&self, input: I) -> Result<O> {
        (self.func)(input)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
