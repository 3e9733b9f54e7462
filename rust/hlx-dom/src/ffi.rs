//! FFI module for embedding hosts
//!
//! C-compatible entry points so a host page runtime can initialise logging
//! and push markup through the parser and serializer.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::node::Document;

/// Initialize the DOM library (installs the `env_logger` backend)
#[no_mangle]
pub extern "C" fn hlx_dom_init() {
    let _ = env_logger::try_init();
}

/// Get library version
#[no_mangle]
pub extern "C" fn hlx_dom_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Parse `html` and serialize it back (caller frees with `hlx_dom_string_free`)
#[no_mangle]
pub extern "C" fn hlx_dom_normalize_html(html: *const c_char) -> *mut c_char {
    if html.is_null() {
        return ptr::null_mut();
    }
    let source = unsafe { CStr::from_ptr(html) };
    let Ok(source) = source.to_str() else {
        log::warn!("hlx_dom_normalize_html: input is not valid UTF-8");
        return ptr::null_mut();
    };

    let doc = Document::parse(source);
    match CString::new(doc.to_html()) {
        Ok(out) => out.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by this library
#[no_mangle]
pub extern "C" fn hlx_dom_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_nul_terminated() {
        let version = unsafe { CStr::from_ptr(hlx_dom_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_normalize_roundtrip() {
        hlx_dom_init();
        let input = CString::new("<DIV Class=\"a\">x</DIV>").unwrap();
        let out = hlx_dom_normalize_html(input.as_ptr());
        assert!(!out.is_null());

        let normalized = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        hlx_dom_string_free(out);
        assert_eq!(normalized, "<div class=\"a\">x</div>");
    }

    #[test]
    fn test_normalize_keeps_doctype() {
        let input = CString::new("<!doctype HTML><html><body><script>if (a<b) {}</script></body></html>").unwrap();
        let out = hlx_dom_normalize_html(input.as_ptr());
        let normalized = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        hlx_dom_string_free(out);
        assert_eq!(
            normalized,
            "<!DOCTYPE html><html><body><script>if (a<b) {}</script></body></html>"
        );
    }

    #[test]
    fn test_null_input() {
        assert!(hlx_dom_normalize_html(ptr::null()).is_null());
        hlx_dom_string_free(ptr::null_mut());
    }
}
