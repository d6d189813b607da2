/// An error produced while decoding a shared brotli stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    InitFailure,
    InvalidStream(String),
    InvalidDictionary,
    MaxSizeExceeded,
    ExcessInputData,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::InitFailure => write!(f, "Failed to initialize the brotli decoder."),
            DecodeError::InvalidStream(msg) => {
                write!(
                    f,
                    "Brotli compressed stream is invalid, decoding failed: {}",
                    msg
                )
            }
            DecodeError::InvalidDictionary => write!(f, "Shared dictionary format is invalid."),
            DecodeError::MaxSizeExceeded => write!(f, "Decompressed size greater than maximum."),
            DecodeError::ExcessInputData => write!(
                f,
                "There is unconsumed data in the input stream after decoding."
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// An error produced while encoding a shared brotli patch.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    InitFailure,
    DictionaryAttachFailed,
    StreamError,
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::InitFailure => write!(f, "Failed to initialize the brotli encoder."),
            EncodeError::DictionaryAttachFailed => {
                write!(f, "Failed to attach the shared dictionary to the encoder.")
            }
            EncodeError::StreamError => write!(f, "Brotli encoder stream operation failed."),
        }
    }
}

impl std::error::Error for EncodeError {}
