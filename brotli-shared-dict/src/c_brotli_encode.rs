use crate::error::EncodeError;
use brotlic_sys::{
    BrotliEncoderAttachPreparedDictionary, BrotliEncoderCompressStream,
    BrotliEncoderCreateInstance, BrotliEncoderDestroyInstance, BrotliEncoderDestroyPreparedDictionary,
    BrotliEncoderIsFinished, BrotliEncoderOperation_BROTLI_OPERATION_FINISH,
    BrotliEncoderOperation_BROTLI_OPERATION_PROCESS, BrotliEncoderParameter_BROTLI_PARAM_QUALITY,
    BrotliEncoderParameter_BROTLI_PARAM_SIZE_HINT, BrotliEncoderPrepareDictionary,
    BrotliEncoderSetParameter, BrotliEncoderTakeOutput,
    BrotliSharedDictionaryType_BROTLI_SHARED_DICTIONARY_RAW, BROTLI_FALSE, BROTLI_MAX_QUALITY,
};
use core::ptr;

/// Quality level used for all diff encodes. Matches the original patch_subset
/// implementation, which always compresses at max quality since patch size,
/// not encode latency, is what matters on the wire.
const DIFF_QUALITY: u32 = 9;

pub fn shared_brotli_encode_c(
    derived: &[u8],
    shared_dictionary: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    let dictionary = match shared_dictionary {
        Some(base) if !base.is_empty() => unsafe {
            let dict = BrotliEncoderPrepareDictionary(
                BrotliSharedDictionaryType_BROTLI_SHARED_DICTIONARY_RAW,
                base.len(),
                base.as_ptr(),
                BROTLI_MAX_QUALITY as i32,
                None,
                None,
                ptr::null_mut(),
            );
            if dict.is_null() {
                return Err(EncodeError::DictionaryAttachFailed);
            }
            Some(dict)
        },
        _ => None,
    };

    let encoder = unsafe { BrotliEncoderCreateInstance(None, None, ptr::null_mut()) };
    if encoder.is_null() {
        if let Some(dict) = dictionary {
            unsafe { BrotliEncoderDestroyPreparedDictionary(dict) };
        }
        return Err(EncodeError::InitFailure);
    }

    let ok = unsafe {
        BrotliEncoderSetParameter(encoder, BrotliEncoderParameter_BROTLI_PARAM_QUALITY, DIFF_QUALITY)
            != BROTLI_FALSE
            && BrotliEncoderSetParameter(
                encoder,
                BrotliEncoderParameter_BROTLI_PARAM_SIZE_HINT,
                derived.len() as u32,
            ) != BROTLI_FALSE
            && dictionary
                .map(|dict| {
                    BrotliEncoderAttachPreparedDictionary(encoder, dict) != BROTLI_FALSE
                })
                .unwrap_or(true)
    };

    if !ok {
        unsafe {
            BrotliEncoderDestroyInstance(encoder);
        }
        if let Some(dict) = dictionary {
            unsafe { BrotliEncoderDestroyPreparedDictionary(dict) };
        }
        return Err(EncodeError::DictionaryAttachFailed);
    }

    let mut sink: Vec<u8> = Vec::with_capacity(derived.len());
    let mut next_in = derived.as_ptr();
    let mut available_in = derived.len();

    let mut ok = true;
    while ok && (available_in > 0 || unsafe { BrotliEncoderIsFinished(encoder) } == BROTLI_FALSE) {
        let operation = if available_in > 0 {
            BrotliEncoderOperation_BROTLI_OPERATION_PROCESS
        } else {
            BrotliEncoderOperation_BROTLI_OPERATION_FINISH
        };

        let mut available_out: usize = 0;
        ok = unsafe {
            BrotliEncoderCompressStream(
                encoder,
                operation,
                &mut available_in,
                &mut next_in,
                &mut available_out,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        } != BROTLI_FALSE;

        let mut buffer_size: usize = 0;
        let buffer = unsafe { BrotliEncoderTakeOutput(encoder, &mut buffer_size) };
        if buffer_size > 0 {
            sink.extend_from_slice(unsafe { std::slice::from_raw_parts(buffer, buffer_size) });
        }
    }

    unsafe {
        BrotliEncoderDestroyInstance(encoder);
    }
    if let Some(dict) = dictionary {
        unsafe { BrotliEncoderDestroyPreparedDictionary(dict) };
    }

    if !ok {
        return Err(EncodeError::StreamError);
    }

    Ok(sink)
}
