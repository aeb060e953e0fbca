//! AST seeding: a single pre-order walk that primes the value-flow graph
//!
//! Each expression visit returns the set of graph nodes the expression may
//! evaluate to. Constructs without a dedicated rule recurse generically and
//! leave whatever the last visited child produced; the analysis stays flow-
//! and context-insensitive, so function bodies contribute to the same
//! global graph.

use std::collections::HashMap;

use swc_ecma_ast::{
    ArrowExpr, AssignExpr, AssignOp, AssignTarget, BinaryOp, BlockStmt, BlockStmtOrExpr, Class,
    ClassMember, Decl, DefaultDecl, Expr, ForHead, Function, Ident, Lit, MemberExpr, MemberProp,
    Module, ModuleDecl, ModuleExportName, ModuleItem, ObjectLit, Pat, Prop, PropName,
    PropOrSpread, SimpleAssignTarget, Stmt, VarDecl, VarDeclOrExpr,
};

use super::graph::{FlowGraph, NodeId};

pub(crate) struct Seeder<'a> {
    graph: &'a mut FlowGraph,
    bindings: &'a mut HashMap<String, NodeId>,
    exports: &'a mut Vec<String>,
    dynamic: NodeId,
    var_init_flow: bool,
}

impl<'a> Seeder<'a> {
    pub(crate) fn new(
        graph: &'a mut FlowGraph,
        bindings: &'a mut HashMap<String, NodeId>,
        exports: &'a mut Vec<String>,
        dynamic: NodeId,
        var_init_flow: bool,
    ) -> Self {
        Self {
            graph,
            bindings,
            exports,
            dynamic,
            var_init_flow,
        }
    }

    pub(crate) fn visit_module(&mut self, module: &Module) {
        for item in &module.body {
            self.visit_module_item(item);
        }
    }

    fn visit_module_item(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::Stmt(stmt) => self.visit_stmt(stmt),
            ModuleItem::ModuleDecl(decl) => self.visit_module_decl(decl),
        }
    }

    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::ExportDecl(export) => {
                self.record_exported_decl(&export.decl);
                self.visit_decl(&export.decl);
            }
            ModuleDecl::ExportNamed(named) => {
                for specifier in &named.specifiers {
                    if let swc_ecma_ast::ExportSpecifier::Named(n) = specifier {
                        if let ModuleExportName::Ident(ident) = &n.orig {
                            self.exports.push(ident.sym.to_string());
                        }
                    }
                }
            }
            ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::Fn(fn_expr) => {
                    let nodes = self.visit_fn_expr(fn_expr);
                    self.bind_default(&nodes);
                }
                DefaultDecl::Class(class_expr) => {
                    self.visit_class(&class_expr.class);
                }
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            ModuleDecl::ExportDefaultExpr(export) => {
                let nodes = self.visit_expr(&export.expr);
                self.bind_default(&nodes);
            }
            // Imported names stay unbound; references to them resolve to
            // the dynamic node.
            _ => {}
        }
    }

    fn bind_default(&mut self, values: &[NodeId]) {
        let node = match self.bindings.get("default") {
            Some(&existing) => existing,
            None => {
                let node = self.graph.create_node(None);
                self.bindings.insert("default".to_string(), node);
                node
            }
        };
        for &value in values {
            self.graph.connect(value, node);
        }
        self.exports.push("default".to_string());
    }

    fn record_exported_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(fn_decl) => self.exports.push(fn_decl.ident.sym.to_string()),
            Decl::Var(var_decl) => {
                for declarator in &var_decl.decls {
                    if let Pat::Ident(ident) = &declarator.name {
                        self.exports.push(ident.sym.to_string());
                    }
                }
            }
            Decl::Class(class_decl) => self.exports.push(class_decl.ident.sym.to_string()),
            _ => {}
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.visit_decl(decl),
            Stmt::Expr(expr_stmt) => {
                self.visit_expr(&expr_stmt.expr);
            }
            Stmt::Block(block) => self.visit_block(block),
            Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.test);
                self.visit_stmt(&if_stmt.cons);
                if let Some(alt) = &if_stmt.alt {
                    self.visit_stmt(alt);
                }
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.test);
                self.visit_stmt(&while_stmt.body);
            }
            Stmt::DoWhile(do_while) => {
                self.visit_stmt(&do_while.body);
                self.visit_expr(&do_while.test);
            }
            Stmt::For(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    match init {
                        VarDeclOrExpr::VarDecl(var_decl) => self.visit_var_decl(var_decl),
                        VarDeclOrExpr::Expr(expr) => {
                            self.visit_expr(expr);
                        }
                    }
                }
                if let Some(test) = &for_stmt.test {
                    self.visit_expr(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.visit_expr(update);
                }
                self.visit_stmt(&for_stmt.body);
            }
            Stmt::ForIn(for_in) => {
                self.visit_for_head(&for_in.left);
                self.visit_expr(&for_in.right);
                self.visit_stmt(&for_in.body);
            }
            Stmt::ForOf(for_of) => {
                self.visit_for_head(&for_of.left);
                self.visit_expr(&for_of.right);
                self.visit_stmt(&for_of.body);
            }
            Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.visit_expr(arg);
                }
            }
            Stmt::Switch(switch_stmt) => {
                self.visit_expr(&switch_stmt.discriminant);
                for case in &switch_stmt.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    for stmt in &case.cons {
                        self.visit_stmt(stmt);
                    }
                }
            }
            Stmt::Try(try_stmt) => {
                self.visit_block(&try_stmt.block);
                if let Some(handler) = &try_stmt.handler {
                    self.visit_block(&handler.body);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    self.visit_block(finalizer);
                }
            }
            Stmt::Throw(throw) => {
                self.visit_expr(&throw.arg);
            }
            Stmt::Labeled(labeled) => self.visit_stmt(&labeled.body),
            _ => {}
        }
    }

    fn visit_block(&mut self, block: &BlockStmt) {
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_for_head(&mut self, head: &ForHead) {
        if let ForHead::VarDecl(var_decl) = head {
            self.visit_var_decl(var_decl);
        }
    }

    fn visit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(var_decl) => self.visit_var_decl(var_decl),
            Decl::Fn(fn_decl) => {
                self.define_function(Some(&fn_decl.ident), &fn_decl.function);
            }
            Decl::Class(class_decl) => self.visit_class(&class_decl.class),
            _ => {}
        }
    }

    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        for declarator in &var_decl.decls {
            match &declarator.name {
                Pat::Ident(ident) => {
                    let name = ident.sym.to_string();
                    let node = match self.bindings.get(&name) {
                        Some(&existing) => existing,
                        None => {
                            let node = self.graph.create_node(Some(ident.span));
                            self.bindings.insert(name, node);
                            node
                        }
                    };
                    if let Some(init) = &declarator.init {
                        let values = self.visit_expr(init);
                        if self.var_init_flow {
                            for value in values {
                                self.graph.connect(value, node);
                            }
                        }
                    }
                }
                // Destructuring declarations are unmodeled; the initializer
                // is still evaluated and the names stay unbound.
                _ => {
                    if let Some(init) = &declarator.init {
                        self.visit_expr(init);
                    }
                }
            }
        }
    }

    /// Create the value node for a function definition, record it, and bind
    /// its declared name on first declaration. The body is entered by the
    /// generic statement walk.
    fn define_function(&mut self, ident: Option<&Ident>, function: &Function) -> NodeId {
        let node = self.graph.create_node(Some(function.span));
        let name = ident.map(|i| i.sym.to_string());
        let f = self.graph.register_function(name.clone(), function.span, node);
        self.graph.add_function(node, f);

        if let Some(name) = name {
            self.bindings.entry(name).or_insert(node);
        }

        for param in &function.params {
            self.visit_pat_defaults(&param.pat);
        }
        if let Some(body) = &function.body {
            self.visit_block(body);
        }
        node
    }

    fn visit_pat_defaults(&mut self, pat: &Pat) {
        if let Pat::Assign(assign) = pat {
            self.visit_expr(&assign.right);
        }
    }

    fn visit_class(&mut self, class: &Class) {
        if let Some(super_class) = &class.super_class {
            self.visit_expr(super_class);
        }
        for member in &class.body {
            match member {
                ClassMember::Method(method) => {
                    if let Some(body) = &method.function.body {
                        self.visit_block(body);
                    }
                }
                ClassMember::PrivateMethod(method) => {
                    if let Some(body) = &method.function.body {
                        self.visit_block(body);
                    }
                }
                ClassMember::Constructor(ctor) => {
                    if let Some(body) = &ctor.body {
                        self.visit_block(body);
                    }
                }
                ClassMember::ClassProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.visit_expr(value);
                    }
                }
                ClassMember::PrivateProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.visit_expr(value);
                    }
                }
                ClassMember::StaticBlock(block) => self.visit_block(&block.body),
                _ => {}
            }
        }
    }

    /// Evaluate an expression to the set of nodes it may produce.
    fn visit_expr(&mut self, expr: &Expr) -> Vec<NodeId> {
        match expr {
            Expr::Ident(ident) => vec![self.resolve(ident)],
            Expr::Lit(_) => Vec::new(),
            Expr::Assign(assign) => self.visit_assign_expr(assign),
            Expr::Bin(bin) => {
                let left = self.visit_expr(&bin.left);
                let right = self.visit_expr(&bin.right);
                if bin.op == BinaryOp::LogicalOr {
                    // Either operand may be the value.
                    let mut union = left;
                    for node in right {
                        if !union.contains(&node) {
                            union.push(node);
                        }
                    }
                    union
                } else {
                    right
                }
            }
            Expr::Fn(fn_expr) => self.visit_fn_expr(fn_expr),
            Expr::Arrow(arrow) => self.visit_arrow_expr(arrow),
            Expr::Object(obj) => self.visit_object_lit(obj),
            Expr::Member(member) => self.visit_member_expr(member),
            Expr::OptChain(opt_chain) => match opt_chain.base.as_ref() {
                swc_ecma_ast::OptChainBase::Member(member) => self.visit_member_expr(member),
                swc_ecma_ast::OptChainBase::Call(call) => {
                    let mut last = self.visit_expr(&call.callee);
                    for arg in &call.args {
                        last = self.visit_expr(&arg.expr);
                    }
                    last
                }
            },
            Expr::Paren(paren) => self.visit_expr(&paren.expr),
            Expr::Seq(seq) => {
                let mut last = Vec::new();
                for expr in &seq.exprs {
                    last = self.visit_expr(expr);
                }
                last
            }
            Expr::Cond(cond) => {
                self.visit_expr(&cond.test);
                self.visit_expr(&cond.cons);
                self.visit_expr(&cond.alt)
            }
            Expr::Call(call) => {
                let mut last = match &call.callee {
                    swc_ecma_ast::Callee::Expr(callee) => self.visit_expr(callee),
                    _ => Vec::new(),
                };
                for arg in &call.args {
                    last = self.visit_expr(&arg.expr);
                }
                last
            }
            Expr::New(new_expr) => {
                let mut last = self.visit_expr(&new_expr.callee);
                if let Some(args) = &new_expr.args {
                    for arg in args {
                        last = self.visit_expr(&arg.expr);
                    }
                }
                last
            }
            Expr::Unary(unary) => self.visit_expr(&unary.arg),
            Expr::Update(update) => self.visit_expr(&update.arg),
            Expr::Await(await_expr) => self.visit_expr(&await_expr.arg),
            Expr::Yield(yield_expr) => match &yield_expr.arg {
                Some(arg) => self.visit_expr(arg),
                None => Vec::new(),
            },
            Expr::Tpl(tpl) => {
                let mut last = Vec::new();
                for expr in &tpl.exprs {
                    last = self.visit_expr(expr);
                }
                last
            }
            Expr::TaggedTpl(tagged) => {
                let mut last = self.visit_expr(&tagged.tag);
                for expr in &tagged.tpl.exprs {
                    last = self.visit_expr(expr);
                }
                last
            }
            Expr::Array(array) => {
                let mut last = Vec::new();
                for elem in array.elems.iter().flatten() {
                    last = self.visit_expr(&elem.expr);
                }
                last
            }
            Expr::Class(class_expr) => {
                self.visit_class(&class_expr.class);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// An unqualified reference resolves to its binding, or to the dynamic
    /// node when no binding exists. Unresolved names never create bindings.
    fn resolve(&self, ident: &Ident) -> NodeId {
        self.bindings
            .get(&*ident.sym)
            .copied()
            .unwrap_or(self.dynamic)
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) -> Vec<NodeId> {
        if assign.op != AssignOp::Assign {
            // Compound assignments carry no dedicated rule; both sides are
            // evaluated and the result is opaque.
            self.visit_assign_target_as_read(&assign.left);
            return self.visit_expr(&assign.right);
        }

        let targets = self.lvalue_nodes(&assign.left);
        let values = self.visit_expr(&assign.right);
        for &target in &targets {
            for &value in &values {
                self.graph.connect(value, target);
            }
        }
        values
    }

    fn visit_assign_target_as_read(&mut self, target: &AssignTarget) {
        if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = target {
            self.visit_member_expr(member);
        }
    }

    fn lvalue_nodes(&mut self, target: &AssignTarget) -> Vec<NodeId> {
        match target {
            AssignTarget::Simple(simple) => match simple {
                SimpleAssignTarget::Ident(ident) => {
                    vec![self
                        .bindings
                        .get(&*ident.sym)
                        .copied()
                        .unwrap_or(self.dynamic)]
                }
                SimpleAssignTarget::Member(member) => self.visit_member_expr(member),
                SimpleAssignTarget::Paren(paren) => self.visit_expr(&paren.expr),
                _ => Vec::new(),
            },
            // Destructuring assignment targets are unmodeled.
            AssignTarget::Pat(_) => Vec::new(),
        }
    }

    fn visit_fn_expr(&mut self, fn_expr: &swc_ecma_ast::FnExpr) -> Vec<NodeId> {
        let node = self.define_function(fn_expr.ident.as_ref(), &fn_expr.function);
        vec![node]
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) -> Vec<NodeId> {
        let node = self.graph.create_node(Some(arrow.span));
        let f = self.graph.register_function(None, arrow.span, node);
        self.graph.add_function(node, f);

        for param in &arrow.params {
            self.visit_pat_defaults(param);
        }
        match arrow.body.as_ref() {
            BlockStmtOrExpr::BlockStmt(block) => self.visit_block(block),
            BlockStmtOrExpr::Expr(expr) => {
                self.visit_expr(expr);
            }
        }
        vec![node]
    }

    fn visit_object_lit(&mut self, obj: &ObjectLit) -> Vec<NodeId> {
        let node = self.graph.create_node(Some(obj.span));

        for prop in &obj.props {
            match prop {
                PropOrSpread::Prop(prop) => match prop.as_ref() {
                    Prop::KeyValue(kv) => {
                        let values = self.visit_expr(&kv.value);
                        self.store_initializer(node, &kv.key, &values);
                    }
                    Prop::Shorthand(ident) => {
                        let value = self.resolve(ident);
                        let member = self.graph.member(node, &ident.sym.to_string());
                        self.graph.connect(value, member);
                    }
                    Prop::Method(method) => {
                        let value = self.define_function(None, &method.function);
                        self.store_initializer(node, &method.key, &[value]);
                    }
                    Prop::Getter(getter) => {
                        if let Some(body) = &getter.body {
                            self.visit_block(body);
                        }
                    }
                    Prop::Setter(setter) => {
                        if let Some(body) = &setter.body {
                            self.visit_block(body);
                        }
                    }
                    Prop::Assign(_) => {}
                },
                PropOrSpread::Spread(spread) => {
                    self.visit_expr(&spread.expr);
                }
            }
        }

        vec![node]
    }

    fn store_initializer(&mut self, node: NodeId, key: &PropName, values: &[NodeId]) {
        let target = match key {
            PropName::Ident(ident) => self.graph.member(node, &ident.sym.to_string()),
            PropName::Str(s) => self.graph.member(node, &s.value.to_string()),
            PropName::Computed(computed) => {
                self.visit_expr(&computed.expr);
                self.graph.dynamic_member(node)
            }
            // Numeric keys are not compile-time strings at this layer.
            PropName::Num(_) | PropName::BigInt(_) => self.graph.dynamic_member(node),
        };
        for &value in values {
            self.graph.connect(value, target);
        }
    }

    fn visit_member_expr(&mut self, member: &MemberExpr) -> Vec<NodeId> {
        let objects = self.visit_expr(&member.obj);

        match &member.prop {
            MemberProp::Ident(ident) => {
                let name = ident.sym.to_string();
                objects
                    .into_iter()
                    .map(|object| self.graph.member(object, &name))
                    .collect()
            }
            MemberProp::PrivateName(private) => {
                let name = format!("#{}", private.name);
                objects
                    .into_iter()
                    .map(|object| self.graph.member(object, &name))
                    .collect()
            }
            MemberProp::Computed(computed) => {
                if let Expr::Lit(Lit::Str(s)) = computed.expr.as_ref() {
                    let name = s.value.to_string();
                    objects
                        .into_iter()
                        .map(|object| self.graph.member(object, &name))
                        .collect()
                } else {
                    self.visit_expr(&computed.expr);
                    objects
                        .into_iter()
                        .map(|object| self.graph.dynamic_member(object))
                        .collect()
                }
            }
        }
    }
}
