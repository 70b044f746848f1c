//! Test modules for the native backend.

mod literal_tests;

/// Shared harness: hand-built IR, compilation, and JIT execution with a
/// stubbed-out runtime.
pub mod helper {
    use inkwell::context::Context;
    use inkwell::execution_engine::ExecutionEngine;
    use inkwell::module::Module;
    use inkwell::OptimizationLevel;
    use rustc_hash::FxHashMap;

    use braid_ir::{
        BinaryOp, CompilerIr, ExprArena, ExprId, ExprKind, Proc, Prog, ScopeId, Type, UnaryOp,
    };

    use crate::compile;

    /// Builds a well-formed lifted IR the way the front end would: every
    /// node gets a `type_table` entry at allocation, use sites are wired to
    /// definition sites explicitly.
    pub struct IrBuilder {
        pub arena: ExprArena,
        pub type_table: FxHashMap<ExprId, Type>,
        pub defuse: FxHashMap<ExprId, ExprId>,
        pub externs: FxHashMap<ExprId, String>,
        pub procs: FxHashMap<ScopeId, Proc>,
        pub progs: FxHashMap<ScopeId, Prog>,
    }

    impl IrBuilder {
        pub fn new() -> Self {
            Self {
                arena: ExprArena::new(),
                type_table: FxHashMap::default(),
                defuse: FxHashMap::default(),
                externs: FxHashMap::default(),
                procs: FxHashMap::default(),
                progs: FxHashMap::default(),
            }
        }

        pub fn node(&mut self, kind: ExprKind, ty: Type) -> ExprId {
            let id = self.arena.alloc(kind);
            self.type_table.insert(id, ty);
            id
        }

        pub fn int(&mut self, n: i32) -> ExprId {
            self.node(ExprKind::Int(n), Type::Int)
        }

        pub fn float(&mut self, x: f64) -> ExprId {
            self.node(ExprKind::Float(x), Type::Float)
        }

        pub fn str_(&mut self, s: &str) -> ExprId {
            self.node(ExprKind::Str(s.to_string()), Type::Any)
        }

        pub fn param(&mut self, name: &str, ty: Type) -> ExprId {
            self.node(ExprKind::Param { name: name.to_string() }, ty)
        }

        pub fn let_(&mut self, name: &str, init: ExprId, ty: Type) -> ExprId {
            self.node(ExprKind::Let { name: name.to_string(), init }, ty)
        }

        pub fn assign(&mut self, name: &str, def: ExprId, value: ExprId, ty: Type) -> ExprId {
            let id = self.node(ExprKind::Assign { name: name.to_string(), value }, ty);
            self.defuse.insert(id, def);
            id
        }

        pub fn lookup(&mut self, name: &str, def: ExprId, ty: Type) -> ExprId {
            let id = self.node(ExprKind::Lookup { name: name.to_string() }, ty);
            self.defuse.insert(id, def);
            id
        }

        pub fn unary(&mut self, op: UnaryOp, operand: ExprId, ty: Type) -> ExprId {
            self.node(ExprKind::Unary { op, operand }, ty)
        }

        pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, ty: Type) -> ExprId {
            self.node(ExprKind::Binary { op, lhs, rhs }, ty)
        }

        pub fn seq(&mut self, first: ExprId, second: ExprId) -> ExprId {
            let ty = self.type_table[&second].clone();
            self.node(ExprKind::Seq { first, second }, ty)
        }

        pub fn fun(&mut self, proc: ScopeId, ty: Type) -> ExprId {
            self.node(ExprKind::Fun { proc }, ty)
        }

        pub fn quote(&mut self, prog: ScopeId, ty: Type) -> ExprId {
            self.node(ExprKind::Quote { prog }, ty)
        }

        pub fn run(&mut self, code: ExprId, ty: Type) -> ExprId {
            self.node(ExprKind::Run { code }, ty)
        }

        pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>, ty: Type) -> ExprId {
            self.node(ExprKind::Call { callee, args }, ty)
        }

        pub fn proc(
            &mut self,
            id: u32,
            body: ExprId,
            params: Vec<ExprId>,
            free: Vec<ExprId>,
            bound: Vec<ExprId>,
            children: Vec<ScopeId>,
        ) -> ScopeId {
            let sid = ScopeId::new(id);
            self.procs.insert(
                sid,
                Proc {
                    id: Some(sid),
                    body,
                    params,
                    free,
                    bound,
                    persist: vec![],
                    children,
                },
            );
            sid
        }

        pub fn prog(
            &mut self,
            id: u32,
            body: ExprId,
            free: Vec<ExprId>,
            bound: Vec<ExprId>,
            children: Vec<ScopeId>,
        ) -> ScopeId {
            let sid = ScopeId::new(id);
            self.progs.insert(
                sid,
                Prog {
                    id: sid,
                    body,
                    free,
                    bound,
                    persist: vec![],
                    owned_persist: vec![],
                    children,
                },
            );
            sid
        }

        /// Finish with `body` wrapped in a `Root` node, the way the front
        /// end shapes the entry Proc.
        pub fn main_with(
            mut self,
            body: ExprId,
            bound: Vec<ExprId>,
            children: Vec<ScopeId>,
        ) -> CompilerIr {
            let ty = self.type_table[&body].clone();
            let root = self.node(ExprKind::Root { child: body }, ty);
            self.main_raw(root, bound, children)
        }

        /// Finish with `body` used as the entry body unchanged.
        pub fn main_raw(
            self,
            body: ExprId,
            bound: Vec<ExprId>,
            children: Vec<ScopeId>,
        ) -> CompilerIr {
            CompilerIr {
                arena: self.arena,
                procs: self.procs,
                progs: self.progs,
                main: Proc {
                    id: None,
                    body,
                    params: vec![],
                    free: vec![],
                    bound,
                    persist: vec![],
                    children,
                },
                type_table: self.type_table,
                defuse: self.defuse,
                externs: self.externs,
            }
        }
    }

    /// Compile and verify, panicking with the verifier message on failure.
    pub fn compile_ok<'ctx>(context: &'ctx Context, ir: &CompilerIr) -> Module<'ctx> {
        let module = compile(context, ir, None).expect("codegen failed");
        module
            .verify()
            .unwrap_or_else(|msg| panic!("module failed verification:\n{}", msg.to_string_lossy()));
        module
    }

    // Stub runtime. The generated wrappers call these through the JIT's
    // symbol mappings; the stubs only need to exist, not to render anything.
    extern "C" fn rt_mesh_query(_mesh: *mut u8) -> i32 {
        0
    }
    extern "C" fn rt_get_shader(_vert: *mut u8, _frag: *mut u8) -> i32 {
        0
    }
    extern "C" fn rt_draw_mesh(_indices: i32, _count: i32) {}
    extern "C" fn rt_print_mesh(_mesh: *mut u8) {}
    extern "C" fn rt_gl_buffer(_kind: i32, _ptr: *mut u8, _data: *mut u8) -> i32 {
        0
    }
    extern "C" fn rt_detect_error() {}
    extern "C" fn rt_load_obj(_assets: *mut u8, _name: *mut u8) -> *mut u8 {
        std::ptr::null_mut()
    }
    extern "C" fn rt_create_window() -> *mut u8 {
        std::ptr::null_mut()
    }

    fn map_runtime_stubs(ee: &ExecutionEngine<'_>, module: &Module<'_>) {
        let mappings: &[(&str, usize)] = &[
            ("mesh_indices", rt_mesh_query as usize),
            ("mesh_positions", rt_mesh_query as usize),
            ("mesh_normals", rt_mesh_query as usize),
            ("get_shader", rt_get_shader as usize),
            ("draw_mesh", rt_draw_mesh as usize),
            ("print_mesh", rt_print_mesh as usize),
            ("gl_buffer", rt_gl_buffer as usize),
            ("detect_error", rt_detect_error as usize),
            ("load_obj", rt_load_obj as usize),
            ("create_window", rt_create_window as usize),
        ];
        for &(name, addr) in mappings {
            if let Some(func) = module.get_function(name) {
                ee.add_global_mapping(&func, addr);
            }
        }
    }

    /// JIT-run `main` (which takes the ignored environment pointer) for an
    /// Int-typed program.
    #[allow(unsafe_code)]
    pub fn jit_main_i32(module: &Module<'_>) -> i32 {
        let ee = module
            .create_jit_execution_engine(OptimizationLevel::None)
            .expect("failed to create execution engine");
        map_runtime_stubs(&ee, module);
        // SAFETY: `main` is emitted as (ptr) -> i32; the environment is
        // unused by the entry Proc.
        unsafe {
            let main = ee
                .get_function::<unsafe extern "C" fn(*mut u8) -> i32>("main")
                .expect("main not found");
            main.call(std::ptr::null_mut())
        }
    }

    /// JIT-run `main` for a Float-typed program.
    #[allow(unsafe_code)]
    pub fn jit_main_f64(module: &Module<'_>) -> f64 {
        let ee = module
            .create_jit_execution_engine(OptimizationLevel::None)
            .expect("failed to create execution engine");
        map_runtime_stubs(&ee, module);
        // SAFETY: `main` is emitted as (ptr) -> double.
        unsafe {
            let main = ee
                .get_function::<unsafe extern "C" fn(*mut u8) -> f64>("main")
                .expect("main not found");
            main.call(std::ptr::null_mut())
        }
    }
}
