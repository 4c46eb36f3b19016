use std::ptr;

use crate::error;
use crate::types::{LlMessage, LlResult};

/// Release the payload held by `message`, leaving it empty.
///
/// # Safety
/// `message` must be valid for writes. A non-null `data` must have come from this library.
unsafe fn release(message: &mut LlMessage) {
    if !message.data.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(message.data, message.len);
        // SAFETY: `data` was allocated as `Box<[u8]>` by `write_message_out`.
        unsafe {
            drop(Box::from_raw(slice_ptr));
        }
    }
    *message = LlMessage::default();
}

/// Copy `payload` into a library-owned buffer referenced by `out_message`.
///
/// A payload already held by `out_message` is freed first.
pub(crate) fn write_message_out(out_message: *mut LlMessage, payload: &[u8]) -> LlResult {
    if out_message.is_null() {
        return error::set_invalid_argument("out_message cannot be null");
    }

    let message = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *out_message }
    };
    // SAFETY: Existing payload pointers are allocated by this library.
    unsafe { release(message) };

    let boxed_payload: Box<[u8]> = payload.to_vec().into_boxed_slice();
    let len = boxed_payload.len();
    if len > 0 {
        message.data = Box::into_raw(boxed_payload) as *mut u8;
        message.len = len;
    }

    LlResult::Ok
}

/// Free payload memory held by an [`LlMessage`] populated by `ll_receive`.
///
/// # Safety
/// `message` must be either null or a valid pointer to an `LlMessage` created by caller code.
/// If `message->data` is non-null, it must have originated from this library.
#[no_mangle]
pub unsafe extern "C" fn ll_message_free(message: *mut LlMessage) {
    crate::ffi_boundary((), || {
        if message.is_null() {
            return;
        }

        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { release(&mut *message) };
    });
}
