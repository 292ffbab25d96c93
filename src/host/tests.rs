//! End-to-end tests for the syscall host
//!
//! Modules are assembled byte by byte and run through the real interpreter,
//! so every test here crosses the guest/host boundary.

use super::*;

// =============================================================================
// WASM Module Builder (for tests)
// =============================================================================

const I32: u8 = 0x7F;
const I64: u8 = 0x7E;

/// Value type lists
const NONE: &[u8] = &[];
const ONE_I32: &[u8] = &[I32];
const TWO_I32: &[u8] = &[I32, I32];
const SIX_I32: &[u8] = &[I32; 6];
const FOUR_I32: &[u8] = &[I32; 4];
const NINE_I32: &[u8] = &[I32; 9];
/// path_open: dirfd, dirflags, path, path_len, oflags, rights x2, fdflags, fd_ptr
const PATH_OPEN_PARAMS: &[u8] = &[I32, I32, I32, I32, I32, I64, I64, I32, I32];
/// fd_seek: fd, offset, whence, pos_ptr
const SEEK_PARAMS: &[u8] = &[I32, I64, I32, I32];

/// Helper to build valid WASM modules for testing
struct WasmBuilder {
    bytes: Vec<u8>,
}

impl WasmBuilder {
    fn new() -> Self {
        Self {
            bytes: vec![
                0x00, 0x61, 0x73, 0x6D, // magic: \0asm
                0x01, 0x00, 0x00, 0x00, // version: 1
            ],
        }
    }

    fn push_leb128(bytes: &mut Vec<u8>, mut value: u32) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                bytes.push(byte);
                break;
            } else {
                bytes.push(byte | 0x80);
            }
        }
    }

    fn push_sleb128(bytes: &mut Vec<u8>, mut value: i64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0) {
                bytes.push(byte);
                break;
            } else {
                bytes.push(byte | 0x80);
            }
        }
    }

    fn push_name(bytes: &mut Vec<u8>, name: &str) {
        Self::push_leb128(bytes, name.len() as u32);
        bytes.extend_from_slice(name.as_bytes());
    }

    fn section(mut self, id: u8, content: &[u8]) -> Self {
        self.bytes.push(id);
        Self::push_leb128(&mut self.bytes, content.len() as u32);
        self.bytes.extend_from_slice(content);
        self
    }

    /// Type section: one `(params) -> (results)` entry per signature
    fn types(self, signatures: &[(&[u8], &[u8])]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, signatures.len() as u32);
        for (params, results) in signatures {
            content.push(0x60); // func type
            Self::push_leb128(&mut content, params.len() as u32);
            content.extend_from_slice(params);
            Self::push_leb128(&mut content, results.len() as u32);
            content.extend_from_slice(results);
        }
        self.section(0x01, &content)
    }

    /// Import section: functions from the WASI namespace as (name, type index)
    fn imports(self, funcs: &[(&str, u32)]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, funcs.len() as u32);
        for (name, type_index) in funcs {
            Self::push_name(&mut content, IMPORT_NAMESPACE);
            Self::push_name(&mut content, name);
            content.push(0x00); // kind = func
            Self::push_leb128(&mut content, *type_index);
        }
        self.section(0x02, &content)
    }

    /// Function section: one defined function per type index
    fn functions(self, type_indices: &[u32]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, type_indices.len() as u32);
        for index in type_indices {
            Self::push_leb128(&mut content, *index);
        }
        self.section(0x03, &content)
    }

    /// Memory section (no max)
    fn memory(self, pages: u32) -> Self {
        let mut content = vec![0x01, 0x00]; // 1 memory, no max
        Self::push_leb128(&mut content, pages);
        self.section(0x05, &content)
    }

    /// Export section as (name, kind, index)
    fn exports(self, entries: &[(&str, u8, u32)]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, entries.len() as u32);
        for (name, kind, index) in entries {
            Self::push_name(&mut content, name);
            content.push(*kind);
            Self::push_leb128(&mut content, *index);
        }
        self.section(0x07, &content)
    }

    /// Code section: each body is the instruction stream without `end`
    fn code(self, bodies: &[Vec<u8>]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, bodies.len() as u32);
        for instructions in bodies {
            let mut body = vec![0x00]; // 0 locals
            body.extend_from_slice(instructions);
            body.push(0x0B); // end
            Self::push_leb128(&mut content, body.len() as u32);
            content.extend_from_slice(&body);
        }
        self.section(0x0A, &content)
    }

    /// Data section: active segments in memory 0 as (offset, bytes)
    fn data(self, segments: &[(u32, &[u8])]) -> Self {
        let mut content = Vec::new();
        Self::push_leb128(&mut content, segments.len() as u32);
        for (offset, bytes) in segments {
            content.push(0x00); // active, memory 0
            content.push(0x41); // i32.const
            Self::push_sleb128(&mut content, *offset as i64);
            content.push(0x0B); // end
            Self::push_leb128(&mut content, bytes.len() as u32);
            content.extend_from_slice(bytes);
        }
        self.section(0x0B, &content)
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Instruction stream builder
#[derive(Default)]
struct Code(Vec<u8>);

impl Code {
    fn i32_const(mut self, value: i32) -> Self {
        self.0.push(0x41);
        WasmBuilder::push_sleb128(&mut self.0, value as i64);
        self
    }

    fn i64_const(mut self, value: i64) -> Self {
        self.0.push(0x42);
        WasmBuilder::push_sleb128(&mut self.0, value);
        self
    }

    fn call(mut self, index: u32) -> Self {
        self.0.push(0x10);
        WasmBuilder::push_leb128(&mut self.0, index);
        self
    }

    /// i32.load align=4 offset=0
    fn i32_load(mut self) -> Self {
        self.0.extend_from_slice(&[0x28, 0x02, 0x00]);
        self
    }

    fn memory_grow(mut self) -> Self {
        self.0.extend_from_slice(&[0x40, 0x00]);
        self
    }

    fn i32_add(mut self) -> Self {
        self.0.push(0x6A);
        self
    }

    fn i32_mul(mut self) -> Self {
        self.0.push(0x6C);
        self
    }

    fn drop_value(mut self) -> Self {
        self.0.push(0x1A);
        self
    }

    fn unreachable(mut self) -> Self {
        self.0.push(0x00);
        self
    }

    fn done(self) -> Vec<u8> {
        self.0
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Export kinds
const FUNC: u8 = 0x00;
const MEMORY: u8 = 0x02;

/// Signatures shared by most test modules
const T_I32_TO_I32: u32 = 0;
const T_I32_TO_NONE: u32 = 1;
const T_NONE: u32 = 2;
const T_I32_I32_TO_I32: u32 = 3;

fn with_signatures(builder: WasmBuilder) -> WasmBuilder {
    builder.types(&[
        (ONE_I32, ONE_I32),
        (ONE_I32, NONE),
        (NONE, NONE),
        (TWO_I32, ONE_I32),
    ])
}

/// A module importing `imports` whose `_start` runs `body`
fn guest(imports: &[(&str, u32)], body: Code) -> Vec<u8> {
    let start_index = imports.len() as u32;
    with_signatures(WasmBuilder::new())
        .imports(imports)
        .functions(&[T_NONE])
        .memory(1)
        .exports(&[("memory", MEMORY, 0), ("_start", FUNC, start_index)])
        .code(&[body.done()])
        .build()
}

/// Create a minimal valid module whose `_start` returns immediately
fn minimal_wasm_module() -> Vec<u8> {
    guest(&[], Code::default())
}

/// Little-endian words, for iovec arrays in data segments
fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn run(config: HostConfig, module: &[u8]) -> HostResult<RunReport> {
    Runner::new(config).run(module)
}

// =============================================================================
// Module Validation Tests
// =============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_validate_empty_module() {
        let result = ModuleValidator::validate(&[], "_start");
        assert!(matches!(result, Err(HostError::InvalidModule { .. })));
    }

    #[test]
    fn test_validate_minimal_module() {
        assert!(ModuleValidator::validate(&minimal_wasm_module(), "_start").is_ok());
    }

    #[test]
    fn test_validate_missing_memory() {
        let module = with_signatures(WasmBuilder::new())
            .functions(&[T_NONE])
            .exports(&[("_start", FUNC, 0)])
            .code(&[Vec::new()])
            .build();
        assert_eq!(
            ModuleValidator::validate(&module, "_start").unwrap_err(),
            HostError::MissingExport {
                name: "memory".to_string()
            }
        );
    }

    #[test]
    fn test_validate_custom_entry() {
        let module = minimal_wasm_module();
        assert_eq!(
            ModuleValidator::validate(&module, "main").unwrap_err(),
            HostError::MissingExport {
                name: "main".to_string()
            }
        );
    }

    #[test]
    fn test_memory_exported_as_function_is_rejected() {
        let module = with_signatures(WasmBuilder::new())
            .functions(&[T_NONE])
            .memory(1)
            .exports(&[("memory", FUNC, 0), ("_start", FUNC, 0)])
            .code(&[Vec::new()])
            .build();
        assert!(ModuleValidator::validate(&module, "_start").is_err());
    }
}

// =============================================================================
// Runner Tests
// =============================================================================

mod runner_tests {
    use super::*;

    #[test]
    fn test_return_from_start_is_success() {
        let report = run(HostConfig::default(), &minimal_wasm_module()).unwrap();
        assert!(report.outcome.is_success());
        assert!(!report.outcome.exited);
        assert!(report.trace.is_none());
    }

    #[test]
    fn test_proc_exit_code() {
        let module = guest(
            &[("proc_exit", T_I32_TO_NONE)],
            Code::default().i32_const(42).call(0),
        );
        let report = run(HostConfig::default(), &module).unwrap();
        assert_eq!(report.outcome.exit_code, 42);
        assert!(report.outcome.exited);
    }

    #[test]
    fn test_proc_exit_zero() {
        let module = guest(
            &[("proc_exit", T_I32_TO_NONE)],
            Code::default().i32_const(0).call(0).unreachable(),
        );
        let report = run(HostConfig::default(), &module).unwrap();
        assert!(report.outcome.is_success());
        assert!(report.outcome.exited);
    }

    #[test]
    fn test_trap_is_host_error() {
        let module = guest(&[], Code::default().unreachable());
        let err = run(HostConfig::default(), &module).unwrap_err();
        assert!(matches!(err, HostError::Trap { .. }));
    }

    #[test]
    fn test_unknown_import_fails_to_link() {
        let module = guest(&[("sock_accept", T_I32_TO_I32)], Code::default());
        let err = run(HostConfig::default(), &module).unwrap_err();
        assert!(matches!(err, HostError::Instantiation { .. }));
    }

    #[test]
    fn test_invalid_module_is_rejected_before_compiling() {
        let err = run(HostConfig::default(), b"not wasm").unwrap_err();
        assert!(matches!(err, HostError::InvalidModule { .. }));
    }

    #[test]
    fn test_custom_entry() {
        let module = with_signatures(WasmBuilder::new())
            .functions(&[T_NONE])
            .memory(1)
            .exports(&[("memory", MEMORY, 0), ("main", FUNC, 0)])
            .code(&[Vec::new()])
            .build();
        let config = HostConfig::builder().entry("main").build();
        assert!(run(config, &module).unwrap().outcome.is_success());
        assert!(run(HostConfig::default(), &module).is_err());
    }
}

// =============================================================================
// Syscall Dispatch Tests
// =============================================================================

mod dispatch_tests {
    use super::*;

    /// args_sizes_get(0, 4) then proc_exit(argc)
    fn argc_module() -> Vec<u8> {
        guest(
            &[
                ("args_sizes_get", T_I32_I32_TO_I32),
                ("proc_exit", T_I32_TO_NONE),
            ],
            Code::default()
                .i32_const(0)
                .i32_const(4)
                .call(0)
                .drop_value()
                .i32_const(0)
                .i32_load()
                .call(1),
        )
    }

    #[test]
    fn test_argc_reaches_guest() {
        let config = HostConfig::builder().args(["prog", "a", "b"]).build();
        let report = run(config, &argc_module()).unwrap();
        assert_eq!(report.outcome.exit_code, 3);
    }

    #[test]
    fn test_errno_reaches_guest() {
        // proc_exit(fd_close(3))
        let module = guest(
            &[("fd_close", T_I32_TO_I32), ("proc_exit", T_I32_TO_NONE)],
            Code::default().i32_const(3).call(0).call(1),
        );
        let report = run(HostConfig::default(), &module).unwrap();
        assert_eq!(report.outcome.exit_code, Errno::BadF.code());
    }

    #[test]
    fn test_out_of_bounds_pointer_is_eio() {
        // proc_exit(args_sizes_get(65535, 0)) with one page of memory
        let module = guest(
            &[
                ("args_sizes_get", T_I32_I32_TO_I32),
                ("proc_exit", T_I32_TO_NONE),
            ],
            Code::default().i32_const(65535).i32_const(0).call(0).call(1),
        );
        let report = run(HostConfig::default(), &module).unwrap();
        assert_eq!(report.outcome.exit_code, Errno::Io.code());
    }

    #[test]
    fn test_memory_view_follows_growth() {
        // Grow by one page, then write the sizes into the new page
        let base = GuestMemory::PAGE_SIZE as i32;
        let module = guest(
            &[
                ("args_sizes_get", T_I32_I32_TO_I32),
                ("proc_exit", T_I32_TO_NONE),
            ],
            Code::default()
                .i32_const(1)
                .memory_grow()
                .drop_value()
                .i32_const(base + 16)
                .i32_const(base + 20)
                .call(0)
                .drop_value()
                .i32_const(base + 16)
                .i32_load()
                .call(1),
        );
        let config = HostConfig::builder().args(["prog", "x"]).build();
        let report = run(config, &module).unwrap();
        assert_eq!(report.outcome.exit_code, 2);
    }

    #[test]
    fn test_readlink_without_sentinel_is_enosys() {
        // proc_exit(path_readlink(3, 0, 0, 0, 0, 0))
        let module = WasmBuilder::new()
            .types(&[(SIX_I32, ONE_I32), (ONE_I32, NONE), (NONE, NONE)])
            .imports(&[("path_readlink", 0), ("proc_exit", 1)])
            .functions(&[2])
            .memory(1)
            .exports(&[("memory", MEMORY, 0), ("_start", FUNC, 2)])
            .code(&[Code::default()
                .i32_const(3)
                .i32_const(0)
                .i32_const(0)
                .i32_const(0)
                .i32_const(0)
                .i32_const(0)
                .call(0)
                .call(1)
                .done()])
            .build();
        let report = run(HostConfig::default(), &module).unwrap();
        assert_eq!(report.outcome.exit_code, Errno::NoSys.code());
    }

    #[test]
    fn test_trace_records_syscalls() {
        let module = guest(
            &[("fd_close", T_I32_TO_I32), ("proc_exit", T_I32_TO_NONE)],
            Code::default().i32_const(3).call(0).call(1),
        );
        let config = HostConfig::builder().trace(16).build();
        let trace = run(config, &module).unwrap().trace.unwrap();

        let events: Vec<_> = trace.events().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].syscall, Syscall::FdClose);
        assert_eq!(events[0].args, vec![3]);
        assert_eq!(events[0].status, 8);
        assert_eq!(events[1].syscall, Syscall::ProcExit);
        assert_eq!(trace.stats(Syscall::FdClose).unwrap().errors, 1);
    }

    // -------------------------------------------------------------------------
    // File I/O through the boundary
    // -------------------------------------------------------------------------

    /// Import indices of the file I/O module
    const PATH_OPEN: u32 = 0;
    const FD_WRITE: u32 = 1;
    const FD_READ: u32 = 2;
    const FD_SEEK: u32 = 3;
    const FD_CLOSE: u32 = 4;
    const PROC_EXIT: u32 = 5;

    /// Guest memory layout
    const FD_SLOT: i32 = 0;
    const NWRITTEN: i32 = 4;
    const POSITION: i32 = 8;
    const WRITE_IOVS: u32 = 16;
    const NREAD: i32 = 40;
    const READ_IOVS: u32 = 48;
    const COPY_IOVS: u32 = 80;
    const SOURCE_PATH: u32 = 1024;
    const COPY_PATH: u32 = 2048;

    const RIGHTS_BASE: i64 = 0x1_0000_0040;
    const RIGHTS_INHERITING: i64 = 0x2_0000_0000;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("wasmhost_e2e_{}_{}", tag, std::process::id()))
    }

    fn open_file(code: Code, path: u32, path_len: usize, oflags: i32, rights: (i64, i64)) -> Code {
        code.i32_const(3)
            .i32_const(0)
            .i32_const(path as i32)
            .i32_const(path_len as i32)
            .i32_const(oflags)
            .i64_const(rights.0)
            .i64_const(rights.1)
            .i32_const(0)
            .i32_const(FD_SLOT)
            .call(PATH_OPEN)
            .drop_value()
    }

    fn load_fd(code: Code) -> Code {
        code.i32_const(FD_SLOT).i32_load()
    }

    /// `fd_read`/`fd_write` on the current fd with two iovecs
    fn transfer(code: Code, import: u32, iovs: u32, result: i32) -> Code {
        load_fd(code)
            .i32_const(iovs as i32)
            .i32_const(2)
            .i32_const(result)
            .call(import)
            .drop_value()
    }

    fn close_fd(code: Code) -> Code {
        load_fd(code).call(FD_CLOSE).drop_value()
    }

    /// Writes "abc" + "defg" to `source`, seeks 4 back from its end, reads
    /// the tail into two buffers and writes both into `copy`. Exits with
    /// `position * 10 + nread`.
    fn file_io_module(source: &str, copy: &str) -> Vec<u8> {
        let mut code = open_file(
            Code::default(),
            SOURCE_PATH,
            source.len(),
            1,
            (RIGHTS_BASE, RIGHTS_INHERITING),
        );
        code = transfer(code, FD_WRITE, WRITE_IOVS, NWRITTEN);
        code = close_fd(code);
        code = open_file(code, SOURCE_PATH, source.len(), 0, (0, 0));
        code = load_fd(code)
            .i64_const(-4)
            .i32_const(2)
            .i32_const(POSITION)
            .call(FD_SEEK)
            .drop_value();
        code = transfer(code, FD_READ, READ_IOVS, NREAD);
        code = close_fd(code);
        code = open_file(code, COPY_PATH, copy.len(), 1, (0, 0));
        code = transfer(code, FD_WRITE, COPY_IOVS, NWRITTEN);
        code = close_fd(code);
        code = code
            .i32_const(POSITION)
            .i32_load()
            .i32_const(10)
            .i32_mul()
            .i32_const(NREAD)
            .i32_load()
            .i32_add()
            .call(PROC_EXIT);

        let write_iovs = words(&[512, 3, 520, 4]);
        let read_iovs = words(&[600, 2, 610, 5]);
        let copy_iovs = words(&[600, 2, 610, 2]);
        WasmBuilder::new()
            .types(&[
                (ONE_I32, ONE_I32),
                (ONE_I32, NONE),
                (NONE, NONE),
                (PATH_OPEN_PARAMS, ONE_I32),
                (SEEK_PARAMS, ONE_I32),
                (FOUR_I32, ONE_I32),
            ])
            .imports(&[
                ("path_open", 3),
                ("fd_write", 5),
                ("fd_read", 5),
                ("fd_seek", 4),
                ("fd_close", 0),
                ("proc_exit", 1),
            ])
            .functions(&[2])
            .memory(1)
            .exports(&[("memory", MEMORY, 0), ("_start", FUNC, 6)])
            .code(&[code.done()])
            .data(&[
                (WRITE_IOVS, write_iovs.as_slice()),
                (READ_IOVS, read_iovs.as_slice()),
                (COPY_IOVS, copy_iovs.as_slice()),
                (512, b"abc".as_slice()),
                (520, b"defg".as_slice()),
                (SOURCE_PATH, source.as_bytes()),
                (COPY_PATH, copy.as_bytes()),
            ])
            .build()
    }

    #[test]
    fn test_file_io_through_guest() {
        let source = temp_path("source");
        let copy = temp_path("copy");
        let module = file_io_module(&source.to_string_lossy(), &copy.to_string_lossy());

        let config = HostConfig::builder().trace(32).build();
        let report = run(config, &module).unwrap();

        // Seek landed at 3 and four bytes came back
        assert_eq!(report.outcome.exit_code, 34);
        assert_eq!(std::fs::read(&source).unwrap(), b"abcdefg");
        assert_eq!(std::fs::read(&copy).unwrap(), b"defg");

        let trace = report.trace.unwrap();
        let events: Vec<_> = trace.events().collect();
        assert_eq!(events.len(), 11);
        for event in &events[..10] {
            assert_eq!(event.status, 0, "{} failed", event.syscall);
        }

        let open = events[0];
        assert_eq!(open.syscall, Syscall::PathOpen);
        assert_eq!(open.args[4], 1);
        assert_eq!(open.args[5], RIGHTS_BASE);
        assert_eq!(open.args[6], RIGHTS_INHERITING);
        assert_eq!(open.args[8], FD_SLOT as i64);

        // The lowest free slot is reused after every close
        assert_eq!(events[1].syscall, Syscall::FdWrite);
        assert_eq!(events[1].args[0], 4);
        assert_eq!(events[4].syscall, Syscall::FdSeek);
        assert_eq!(events[4].args, vec![4, -4, 2, POSITION as i64]);
        assert_eq!(events[5].syscall, Syscall::FdRead);
        assert_eq!(events[5].args[0], 4);

        std::fs::remove_file(source).unwrap();
        std::fs::remove_file(copy).unwrap();
    }

    #[test]
    fn test_path_open32_through_guest() {
        // proc_exit(status * 100 + fd) after path_open32 with all-ones rights
        let path = temp_path("open32");
        std::fs::write(&path, b"x").unwrap();
        let name = path.to_string_lossy().into_owned();

        let module = WasmBuilder::new()
            .types(&[(NINE_I32, ONE_I32), (ONE_I32, NONE), (NONE, NONE)])
            .imports(&[("path_open32", 0), ("proc_exit", 1)])
            .functions(&[2])
            .memory(1)
            .exports(&[("memory", MEMORY, 0), ("_start", FUNC, 2)])
            .code(&[Code::default()
                .i32_const(3)
                .i32_const(0)
                .i32_const(256)
                .i32_const(name.len() as i32)
                .i32_const(0)
                .i32_const(-1)
                .i32_const(-1)
                .i32_const(0)
                .i32_const(FD_SLOT)
                .call(0)
                .i32_const(100)
                .i32_mul()
                .i32_const(FD_SLOT)
                .i32_load()
                .i32_add()
                .call(1)
                .done()])
            .data(&[(256, name.as_bytes())])
            .build();

        let report = run(HostConfig::default(), &module).unwrap();
        assert_eq!(report.outcome.exit_code, 4);

        std::fs::remove_file(path).unwrap();
    }

    // -------------------------------------------------------------------------
    // Shell escape hatch through the boundary
    // -------------------------------------------------------------------------

    /// proc_exit(path_readlink(-1, 100, len, 0, 0, 0)) with `command` at 100
    fn shell_module(command: &str) -> Vec<u8> {
        WasmBuilder::new()
            .types(&[(SIX_I32, ONE_I32), (ONE_I32, NONE), (NONE, NONE)])
            .imports(&[("path_readlink", 0), ("proc_exit", 1)])
            .functions(&[2])
            .memory(1)
            .exports(&[("memory", MEMORY, 0), ("_start", FUNC, 2)])
            .code(&[Code::default()
                .i32_const(-1)
                .i32_const(100)
                .i32_const(command.len() as i32)
                .i32_const(0)
                .i32_const(0)
                .i32_const(0)
                .call(0)
                .call(1)
                .done()])
            .data(&[(100, command.as_bytes())])
            .build()
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_status_reaches_guest() {
        let report = run(HostConfig::default(), &shell_module("exit 7")).unwrap();
        assert_eq!(report.outcome.exit_code, 7);
    }

    #[test]
    fn test_shell_disabled_is_enosys() {
        let config = HostConfig::builder().shell(false).build();
        let report = run(config, &shell_module("exit 7")).unwrap();
        assert_eq!(report.outcome.exit_code, Errno::NoSys.code());
    }
}
