use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// Wraps the body with a drop guard that logs the elapsed time through Bevy's
/// `info!` once the function returns. Without `perf_stats` the guard is compiled out
/// and the function is left untouched.
///
/// # Behaviour
/// - A parameter named `tick` whose type mentions `NavTick` is picked up automatically;
///   the timing is then also logged every 100 ticks, not only when it is slow.
/// - The optional argument is the slow threshold in milliseconds (default 1).
///
/// # Example
/// ```ignore
/// #[profile(2)]
/// pub fn follow_paths(
///     agents: Query<&mut PathFollower>,
///     tick: Res<NavTick>,
/// ) {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_tick_param = sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        if pat_ident.ident != "tick" {
            return false;
        }
        let ty = &pat_type.ty;
        quote!(#ty).to_string().contains("NavTick")
    });

    let guard = if has_tick_param {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
                tick_value: u64,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms || self.tick_value % 100 == 0 {
                        bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
                tick_value: tick.0,
            }
        }
    } else {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms {
                        bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
            }
        }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #guard
            };

            #block
        }
    };

    output.into()
}
