//! Native gkm kernel engine loaded from a shared library
//!
//! The library exports `gkmKernelSuffixTree(opts*, double** kmat, int* counts)`.
//! It writes into a caller-allocated `max_num_seq x max_num_seq` buffer through
//! an array of row pointers and reports the positive and negative counts in
//! `counts[0]` and `counts[1]`. All of that marshaling stays in this file.

use crate::core::{GkmError, Result};
use crate::kernel::{EngineOutput, KernelConfig, KernelEngine};
use libloading::Library;
use log::debug;
use std::ffi::{c_char, c_double, c_int, CString};
use std::path::{Path, PathBuf};

const KERNEL_SYMBOL: &[u8] = b"gkmKernelSuffixTree\0";

/// Option block in the layout the engine expects
#[repr(C)]
struct RawOptions {
    l: c_int,
    k: c_int,
    maxnmm: c_int,
    maxseqlen: c_int,
    maxnumseq: c_int,
    use_tgkm: c_int,
    add_rc: bool,
    use_pseudocnt: bool,
    output_binary: bool,
    posfile: *const c_char,
    negfile: *const c_char,
    wildcard_lambda: c_double,
    wildcard_mismatch_m: c_int,
    alphabet_fn: *const c_char,
    max_n_thread: c_int,
}

type GkmKernelFn = unsafe extern "C" fn(*const RawOptions, *mut *mut c_double, *mut c_int);

/// Kernel engine backed by the native suffix-tree implementation
pub struct NativeEngine {
    library: Library,
    path: PathBuf,
}

impl NativeEngine {
    /// File name the library is usually built as
    pub const DEFAULT_LIBRARY: &'static str = "GkmKernel.so";

    /// Load the shared library and resolve the kernel entry point
    ///
    /// Both a missing library and a missing symbol are reported here, so a
    /// successfully loaded engine cannot fail to bind at compute time.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: loading runs the library's initializers; the engine library
        // has none with preconditions on our side.
        let library = unsafe { Library::new(&path) }
            .map_err(|e| GkmError::EngineLoad(format!("{}: {e}", path.display())))?;

        // SAFETY: the symbol type matches the exported C signature.
        unsafe { library.get::<GkmKernelFn>(KERNEL_SYMBOL) }.map_err(|e| {
            GkmError::EngineLoad(format!(
                "{} does not export gkmKernelSuffixTree: {e}",
                path.display()
            ))
        })?;

        debug!("Loaded kernel engine from {path:?}");
        Ok(Self { library, path })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KernelEngine for NativeEngine {
    fn compute(&self, config: &KernelConfig) -> Result<EngineOutput> {
        let side = config.max_num_seq;
        if side == 0 {
            return Err(GkmError::config("max sequence count must be at least 1"));
        }
        let total = side
            .checked_mul(side)
            .ok_or_else(|| GkmError::config(format!("capacity {side} is too large")))?;

        let pos_file = path_to_cstring(&config.pos_file)?;
        let neg_file = path_to_cstring(&config.neg_file)?;
        let alphabet = config
            .alphabet_file
            .as_deref()
            .map(path_to_cstring)
            .transpose()?;

        let options = RawOptions {
            l: to_c_int("L", config.word_length)?,
            k: to_c_int("K", config.informative_columns)?,
            maxnmm: to_c_int("max mismatch", config.max_mismatch)?,
            maxseqlen: to_c_int("max sequence length", config.max_seq_len)?,
            maxnumseq: to_c_int("max sequence count", side)?,
            use_tgkm: config.kernel_variant,
            add_rc: config.add_reverse_complement,
            use_pseudocnt: config.use_pseudocount,
            output_binary: config.output_binary,
            posfile: pos_file.as_ptr(),
            negfile: neg_file.as_ptr(),
            wildcard_lambda: config.wildcard_lambda,
            wildcard_mismatch_m: to_c_int("wildcard mismatch", config.wildcard_mismatch)?,
            alphabet_fn: alphabet
                .as_ref()
                .map_or(std::ptr::null(), |name| name.as_ptr()),
            max_n_thread: to_c_int("thread count", config.max_threads)?,
        };

        let mut data = vec![0.0_f64; total];
        let mut rows: Vec<*mut c_double> = data
            .chunks_exact_mut(side)
            .map(|row| row.as_mut_ptr())
            .collect();
        let mut counts: [c_int; 2] = [0, 0];

        // SAFETY: the symbol type matches the exported C signature.
        let kernel = unsafe { self.library.get::<GkmKernelFn>(KERNEL_SYMBOL) }
            .map_err(|e| GkmError::EngineLoad(e.to_string()))?;

        debug!("Calling native kernel engine with capacity {side}");

        // SAFETY: `options` and the C strings it points to outlive the call,
        // every row pointer addresses `side` writable doubles inside `data`,
        // and `counts` has room for the two counts the engine writes.
        unsafe { kernel(&options, rows.as_mut_ptr(), counts.as_mut_ptr()) };
        drop(rows);

        let n_pos = count_from_engine("positive", counts[0])?;
        let n_neg = count_from_engine("negative", counts[1])?;

        Ok(EngineOutput {
            side,
            data,
            n_pos,
            n_neg,
        })
    }
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    let text = path
        .to_str()
        .ok_or_else(|| GkmError::config(format!("path is not valid UTF-8: {path:?}")))?;
    CString::new(text)
        .map_err(|_| GkmError::config(format!("path contains a NUL byte: {path:?}")))
}

fn to_c_int(name: &str, value: usize) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| GkmError::config(format!("{name} ({value}) does not fit in a C int")))
}

fn count_from_engine(which: &str, value: c_int) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        GkmError::EngineFailure(format!("engine reported {value} {which} sequences"))
    })
}
