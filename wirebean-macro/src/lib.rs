use proc_macro::TokenStream;

mod bean;

/// Derive macro implementing `wirebean::Bean` for a struct with named fields
///
/// Field attributes (`#[bean(...)]`):
/// - `name = "..."`: bean name for an `Autowired<T>` field
/// - `role = "..."` (or `type = "..."`): role keyword (`controller`, `middleware`, ...)
///   overriding inference
/// - `prefix = "..."`: route prefix recorded on the dependency
/// - `value = "a.b.c"`, `default = "..."`: bind a plain or `Value<T>` field to a config key
/// - `marker`: treat the field's type as an embedded marker
/// - `skip`: leave the field alone
///
/// Struct attributes: `prefix = "..."` and any number of
/// `factory(method = "...", name = "...")`.
///
/// # Example
/// ```ignore
/// use wirebean::prelude::*;
///
/// #[derive(Default, Bean)]
/// #[bean(factory(method = "client"))]
/// pub struct RedisConfig {
///     marker: Configuration,
///     #[bean(value = "rady.redis.port", default = "6379")]
///     port: u16,
/// }
///
/// impl RedisConfig {
///     fn client(&self) -> RedisClient {
///         RedisClient::new(self.port)
///     }
/// }
/// ```
#[proc_macro_derive(Bean, attributes(bean))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    bean::derive_bean(input)
}
