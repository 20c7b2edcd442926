use proc_macro::TokenStream;
use quote::quote;
use syn::{
  parse::{Parse, ParseStream},
  ItemFn,
};

struct Args {
  is_paused: bool,
}

impl Parse for Args {
  fn parse(input: ParseStream) -> syn::Result<Self> {
    if input.is_empty() {
      return Ok(Self { is_paused: false });
    }

    let ident = input.parse::<syn::Ident>()?;
    if ident != "paused" {
      return Err(syn::Error::new(
        ident.span(),
        "expected `paused` or no arguments",
      ));
    }

    Ok(Self { is_paused: true })
  }
}

/// Test attribute that installs the crewdeck logger before the body runs.
///
/// Async tests run on `#[tokio::test]`. Passing `paused` starts the tokio
/// clock paused so timers advance virtually:
///
/// ```ignore
/// #[crewdeck_test::test(paused)]
/// async fn gives_up_after_budget() { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let item_fn = syn::parse_macro_input!(item as ItemFn);
  let args = syn::parse_macro_input!(attr as Args);

  let test_name = item_fn.sig.ident;
  let output = item_fn.sig.output;
  let content = item_fn.block;

  let is_async = item_fn.sig.asyncness.is_some();

  let content = quote! {
    crewdeck_logger::init_logger_with_level(log::Level::Trace);

    #content
  };

  if is_async {
    let runtime = if args.is_paused {
      quote! { #[tokio::test(start_paused = true)] }
    } else {
      quote! { #[tokio::test] }
    };

    return quote! {
      #runtime
      async fn #test_name() #output {
        #content
      }
    }
    .into();
  }

  if args.is_paused {
    return syn::Error::new(
      proc_macro2::Span::call_site(),
      "`paused` requires an async test",
    )
    .to_compile_error()
    .into();
  }

  quote! {
    #[test]
    fn #test_name() #output {
      #content
    }
  }
  .into()
}
