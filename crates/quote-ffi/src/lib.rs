//! C FFI bindings for quote-core
//!
//! This crate provides a C-compatible API so an engine editor plugin can
//! run conversions in-process and copy the result into its own asset type.

use quote_core::{ConversionResult, Converter, DecoderKind, HeaderNames, SourceText};
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Decoder selector: header-position backend
pub const QTAB_DECODER_HEADERS: u32 = 0;
/// Decoder selector: typed serde backend
pub const QTAB_DECODER_TYPED: u32 = 1;

/// Opaque handle to a conversion result
pub struct FfiConversion {
    inner: ConversionResult,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_last_error(message: String) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn decoder_kind(decoder: u32) -> Option<DecoderKind> {
    match decoder {
        QTAB_DECODER_HEADERS => Some(DecoderKind::Headers),
        QTAB_DECODER_TYPED => Some(DecoderKind::Typed),
        _ => None,
    }
}

fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Convert CSV texts into a conversion result
///
/// Null entries in `texts` are skipped. Texts use the default header
/// names (`セリフ`, `タグ1`..`タグ8`, or their English aliases).
///
/// # Safety
/// - `texts` must be a valid pointer to an array of `count` C strings
///   (entries may be null), or null when `count` is 0
/// - Returns null on any decode failure or invalid UTF-8; the reason is
///   then available from `qtab_last_error`
#[no_mangle]
pub unsafe extern "C" fn qtab_convert_texts(
    texts: *const *const c_char,
    count: usize,
    decoder: u32,
) -> *mut FfiConversion {
    clear_last_error();

    if texts.is_null() && count != 0 {
        set_last_error(format!("texts is null but count is {}", count));
        return ptr::null_mut();
    }

    let kind = match decoder_kind(decoder) {
        Some(k) => k,
        None => {
            set_last_error(format!("unknown decoder {}", decoder));
            return ptr::null_mut();
        }
    };

    let mut sources = Vec::with_capacity(count);
    for i in 0..count {
        let text_ptr = *texts.add(i);
        if text_ptr.is_null() {
            continue;
        }
        let text = match CStr::from_ptr(text_ptr).to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("invalid UTF-8 in text[{}]: {}", i, e));
                return ptr::null_mut();
            }
        };
        sources.push(SourceText {
            name: format!("text[{}]", i),
            text: text.to_string(),
        });
    }

    let converter = Converter::with_kind(kind, HeaderNames::default());
    match converter.convert_texts(&sources) {
        Ok(result) => Box::into_raw(Box::new(FfiConversion { inner: result })),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the message of the last failed `qtab_convert_texts` call on this thread
///
/// # Safety
/// - Returns null if the last call succeeded or no call was made
/// - Caller must free the returned string with `qtab_free_string`
#[no_mangle]
pub unsafe extern "C" fn qtab_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| match e.borrow().as_deref() {
        Some(message) => to_c_string(message),
        None => ptr::null_mut(),
    })
}

/// Free a conversion result
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts` or null
#[no_mangle]
pub unsafe extern "C" fn qtab_free_conversion(conversion: *mut FfiConversion) {
    if !conversion.is_null() {
        drop(Box::from_raw(conversion));
    }
}

/// Get the number of records
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
#[no_mangle]
pub unsafe extern "C" fn qtab_record_count(conversion: *const FfiConversion) -> usize {
    if conversion.is_null() {
        return 0;
    }
    (*conversion).inner.record_count()
}

/// Get a record's quote
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `qtab_free_string`
#[no_mangle]
pub unsafe extern "C" fn qtab_record_quote(
    conversion: *const FfiConversion,
    index: usize,
) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    (&(*conversion).inner.records)
        .get(index)
        .map(|r| to_c_string(&r.quote))
        .unwrap_or(ptr::null_mut())
}

/// Get the number of tags on a record
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
#[no_mangle]
pub unsafe extern "C" fn qtab_record_tag_count(
    conversion: *const FfiConversion,
    index: usize,
) -> usize {
    if conversion.is_null() {
        return 0;
    }

    (&(*conversion).inner.records)
        .get(index)
        .map(|r| r.tags.len())
        .unwrap_or(0)
}

/// Get one tag of a record
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
/// - Returns null if either index is out of bounds
/// - Caller must free the returned string with `qtab_free_string`
#[no_mangle]
pub unsafe extern "C" fn qtab_record_tag(
    conversion: *const FfiConversion,
    index: usize,
    tag: usize,
) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    (&(*conversion).inner.records)
        .get(index)
        .and_then(|r| r.tags.get(tag))
        .map(|t| to_c_string(t))
        .unwrap_or(ptr::null_mut())
}

/// Get the number of distinct tags
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
#[no_mangle]
pub unsafe extern "C" fn qtab_tag_index_count(conversion: *const FfiConversion) -> usize {
    if conversion.is_null() {
        return 0;
    }
    (*conversion).inner.tag_count()
}

/// Get a tag index entry
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `qtab_free_string`
#[no_mangle]
pub unsafe extern "C" fn qtab_tag_index_entry(
    conversion: *const FfiConversion,
    index: usize,
) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    (&(*conversion).inner.tag_index)
        .get(index)
        .map(|t| to_c_string(t))
        .unwrap_or(ptr::null_mut())
}

/// Serialize the whole result as JSON
///
/// # Safety
/// - `conversion` must be a valid pointer returned by `qtab_convert_texts`
/// - Caller must free the returned string with `qtab_free_string`
#[no_mangle]
pub unsafe extern "C" fn qtab_conversion_json(conversion: *const FfiConversion) -> *mut c_char {
    if conversion.is_null() {
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*conversion).inner) {
        Ok(json) => to_c_string(&json),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a qtab_* function or null
#[no_mangle]
pub unsafe extern "C" fn qtab_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
