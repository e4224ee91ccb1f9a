use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use syn::{
    Expr, ExprLit, ExprMethodCall, File, FnArg, GenericArgument, Item, ItemFn, Lit, Pat,
    PathArguments, ReturnType, Type, visit::Visit,
};

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
struct RouteEntry {
    method: String,
    path: String,
    source: String,
    request: String,
    response: String,
}

#[derive(Debug, Clone)]
struct HandlerInfo {
    request: String,
    response: String,
}

struct RouteVisitor<'a> {
    source: String,
    consts: &'a HashMap<String, String>,
    handlers: &'a HashMap<String, HandlerInfo>,
    routes: Vec<RouteEntry>,
}

impl<'ast> Visit<'ast> for RouteVisitor<'_> {
    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        let method_name = node.method.to_string();
        if method_name == "route" {
            let path = node
                .args
                .first()
                .and_then(|expr| extract_string(expr, self.consts));
            match path {
                Some(path) => self.push_route(&path, node.args.iter().nth(1)),
                None => println!(
                    "cargo:warning=Skipping non-literal route path in {}",
                    self.source
                ),
            }
        } else if method_name == "router" {
            if let Some(crud) = crud_router_chain(node, self.consts) {
                self.push_crud_routes(crud);
            }
        }

        syn::visit::visit_expr_method_call(self, node);
    }
}

impl RouteVisitor<'_> {
    fn push_route(&mut self, path: &str, target: Option<&Expr>) {
        let mut handlers = target.map(extract_handlers).unwrap_or_default();
        if handlers.is_empty() {
            handlers.push(("ROUTE".to_string(), None));
        }
        for (method, handler) in handlers {
            let info = handler.and_then(|name| self.handlers.get(&name).cloned());
            let (request, response) = info
                .map(|info| (info.request, info.response))
                .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));
            self.routes.push(RouteEntry {
                method,
                path: format!("{API_PREFIX}{path}"),
                source: self.source.clone(),
                request,
                response,
            });
        }
    }

    fn push_crud_routes(&mut self, crud: CrudRouterCall) {
        for method in crud.methods {
            let Some((http, suffix, request, response)) = crud_method_route(&method) else {
                println!(
                    "cargo:warning=Unknown CRUD method {method} in {}",
                    self.source
                );
                continue;
            };
            self.routes.push(RouteEntry {
                method: http.to_string(),
                path: format!("{API_PREFIX}{}{suffix}", crud.base_path),
                source: self.source.clone(),
                request: request.to_string(),
                response: response.to_string(),
            });
        }
    }
}

struct CrudRouterCall {
    base_path: String,
    methods: Vec<String>,
}

const ALL_CRUD_METHODS: [&str; 8] = [
    "Create",
    "List",
    "Get",
    "Patch",
    "Delete",
    "Count",
    "Aggregate",
    "GroupBy",
];

const READ_CRUD_METHODS: [&str; 5] = ["List", "Get", "Count", "Aggregate", "GroupBy"];

fn crud_method_route(
    method: &str,
) -> Option<(&'static str, &'static str, &'static str, &'static str)> {
    let route = match method {
        "Create" => ("POST", "", "json: Model", "Model"),
        "List" => ("GET", "", "query: page, page_size, filters", "PaginatedResponse<Model>"),
        "Get" => ("GET", "/{id}", "path: id", "Model"),
        "Patch" => ("PATCH", "/{id}", "json: partial Model", "Model"),
        "Delete" => ("DELETE", "/{id}", "path: id", "null"),
        "Count" => ("GET", "/count", "query: filters", "CountResponse"),
        "Aggregate" => ("GET", "/aggregate", "query: column, filters", "AggregateResult"),
        "GroupBy" => ("GET", "/group-by", "query: column, filters", "Vec<GroupCount>"),
        _ => return None,
    };
    Some(route)
}

/// Walks `CrudApiRouter::new(..).set_allowed_methods(..)...router()` down to
/// its constructor.
fn crud_router_chain(
    node: &ExprMethodCall,
    consts: &HashMap<String, String>,
) -> Option<CrudRouterCall> {
    let mut methods: Option<Vec<String>> = None;
    let mut receiver = &*node.receiver;
    loop {
        match receiver {
            Expr::MethodCall(call) => {
                if call.method == "set_allowed_methods" && methods.is_none() {
                    methods = call.args.first().map(extract_crud_methods);
                }
                receiver = &call.receiver;
            }
            Expr::Call(call) => {
                let Expr::Path(func) = &*call.func else {
                    return None;
                };
                let segments: Vec<String> = func
                    .path
                    .segments
                    .iter()
                    .map(|seg| seg.ident.to_string())
                    .collect();
                if !segments.ends_with(&["CrudApiRouter".to_string(), "new".to_string()]) {
                    return None;
                }
                let base_path = call
                    .args
                    .iter()
                    .nth(1)
                    .and_then(|expr| extract_string(expr, consts))?;
                let methods = methods.unwrap_or_else(|| {
                    ALL_CRUD_METHODS.iter().map(|name| name.to_string()).collect()
                });
                return Some(CrudRouterCall { base_path, methods });
            }
            Expr::Paren(expr) => receiver = &expr.expr,
            _ => return None,
        }
    }
}

fn extract_crud_methods(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Reference(expr) => extract_crud_methods(&expr.expr),
        Expr::Paren(expr) => extract_crud_methods(&expr.expr),
        Expr::Array(array) => array
            .elems
            .iter()
            .flat_map(extract_crud_methods)
            .collect(),
        Expr::Path(path) => {
            let Some(last) = path.path.segments.last() else {
                return Vec::new();
            };
            match last.ident.to_string().as_str() {
                "READ_METHODS" => READ_CRUD_METHODS.iter().map(|name| name.to_string()).collect(),
                "DEFAULT_ALLOWED_METHODS" => {
                    ALL_CRUD_METHODS.iter().map(|name| name.to_string()).collect()
                }
                name => vec![name.to_string()],
            }
        }
        _ => Vec::new(),
    }
}

fn extract_string(expr: &Expr, consts: &HashMap<String, String>) -> Option<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) => Some(value.value()),
        Expr::Path(path) => path
            .path
            .segments
            .last()
            .and_then(|seg| consts.get(&seg.ident.to_string()).cloned()),
        Expr::Paren(expr) => extract_string(&expr.expr, consts),
        Expr::Reference(expr) => extract_string(&expr.expr, consts),
        _ => None,
    }
}

/// `(HTTP method, handler name)` pairs of a `get(a).post(b)` chain.
fn extract_handlers(expr: &Expr) -> Vec<(String, Option<String>)> {
    let mut out = Vec::new();
    collect_handlers(expr, &mut out);
    out.reverse();
    out
}

fn collect_handlers(expr: &Expr, out: &mut Vec<(String, Option<String>)>) {
    match expr {
        Expr::Call(call) => {
            if let Expr::Path(path) = &*call.func
                && let Some(segment) = path.path.segments.last()
                && let Some(method) = normalize_method(&segment.ident.to_string())
            {
                out.push((method.to_string(), call.args.first().and_then(handler_name)));
            }
        }
        Expr::MethodCall(call) => {
            if let Some(method) = normalize_method(&call.method.to_string()) {
                out.push((method.to_string(), call.args.first().and_then(handler_name)));
            }
            collect_handlers(&call.receiver, out);
        }
        Expr::Paren(expr) => collect_handlers(&expr.expr, out),
        Expr::Reference(expr) => collect_handlers(&expr.expr, out),
        _ => {}
    }
}

fn handler_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(path) => path.path.segments.last().map(|seg| seg.ident.to_string()),
        _ => None,
    }
}

fn normalize_method(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "get" => Some("GET"),
        "post" => Some("POST"),
        "put" => Some("PUT"),
        "delete" => Some("DELETE"),
        "patch" => Some("PATCH"),
        _ => None,
    }
}

fn type_to_string(ty: &Type) -> String {
    quote_type(ty).replace(' ', "")
}

fn quote_type(ty: &Type) -> String {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .iter()
            .map(|seg| match &seg.arguments {
                PathArguments::AngleBracketed(args) => {
                    let inner: Vec<String> = args
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(ty) => Some(quote_type(ty)),
                            _ => None,
                        })
                        .collect();
                    format!("{}<{}>", seg.ident, inner.join(","))
                }
                _ => seg.ident.to_string(),
            })
            .collect::<Vec<_>>()
            .join("::"),
        Type::Reference(reference) => format!("&{}", quote_type(&reference.elem)),
        Type::Slice(slice) => format!("[{}]", quote_type(&slice.elem)),
        Type::Tuple(tuple) if tuple.elems.is_empty() => "()".to_string(),
        Type::Tuple(tuple) => format!(
            "({})",
            tuple.elems.iter().map(quote_type).collect::<Vec<_>>().join(",")
        ),
        _ => "Unknown".to_string(),
    }
}

fn generic_inner(ty: &Type, wrapper: &str) -> Option<Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    })
}

fn handler_info(item: &ItemFn) -> HandlerInfo {
    let mut request = Vec::new();
    for input in &item.sig.inputs {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        if !matches!(&*arg.pat, Pat::TupleStruct(_) | Pat::Ident(_)) {
            continue;
        }
        for (wrapper, label) in [("Json", "json"), ("Query", "query"), ("Path", "path")] {
            if let Some(inner) = generic_inner(&arg.ty, wrapper) {
                request.push(format!("{label}: {}", type_to_string(&inner)));
            }
        }
    }
    let response = match &item.sig.output {
        ReturnType::Type(_, ty) => generic_inner(ty, "ApiResult")
            .map(|inner| type_to_string(&inner))
            .unwrap_or_else(|| type_to_string(ty)),
        ReturnType::Default => "()".to_string(),
    };
    HandlerInfo {
        request: if request.is_empty() {
            "None".to_string()
        } else {
            request.join("; ")
        },
        response,
    }
}

fn escape_rust_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn parse_file(path: &Path, manifest_dir: &Path) -> Vec<RouteEntry> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", path.display(), err));
    let parsed: File = syn::parse_file(&content)
        .unwrap_or_else(|err| panic!("failed to parse {}: {}", path.display(), err));
    let source = path
        .strip_prefix(manifest_dir)
        .unwrap_or(path)
        .display()
        .to_string();

    let mut consts = HashMap::new();
    let mut handlers = HashMap::new();
    for item in &parsed.items {
        match item {
            Item::Const(item) => {
                if let Some(value) = extract_string(&item.expr, &HashMap::new()) {
                    consts.insert(item.ident.to_string(), value);
                }
            }
            Item::Fn(item) if item.sig.asyncness.is_some() => {
                handlers.insert(item.sig.ident.to_string(), handler_info(item));
            }
            _ => {}
        }
    }

    let mut visitor = RouteVisitor {
        source,
        consts: &consts,
        handlers: &handlers,
        routes: Vec::new(),
    };
    for item in &parsed.items {
        if let Item::Fn(item) = item {
            visitor.visit_item_fn(item);
        }
    }
    visitor.routes
}

fn collect_route_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries =
        fs::read_dir(dir).unwrap_or_else(|err| panic!("failed to read {}: {}", dir.display(), err));
    for entry in entries {
        let entry = entry.unwrap_or_else(|err| panic!("failed to read dir entry: {}", err));
        let path = entry.path();
        if path.is_dir() {
            collect_route_files(&path, files);
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
            files.push(path);
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(&manifest_dir);
    let routes_dir = manifest_path.join("src/routes/api");

    let mut files = Vec::new();
    collect_route_files(&routes_dir, &mut files);
    files.sort();
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    let mut routes = Vec::new();
    for file in files {
        routes.extend(parse_file(&file, manifest_path));
    }

    routes.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));
    routes.dedup_by(|a, b| a.path == b.path && a.method == b.method);

    let out_dir = env::var("OUT_DIR").expect("missing OUT_DIR");
    let out_path = Path::new(&out_dir).join("routes_generated.rs");
    let mut output = String::from("pub static ROUTES: &[RouteInfo] = &[\n");
    for route in routes {
        output.push_str(&format!(
            concat!(
                "    RouteInfo {{ method: \"{}\", path: \"{}\", source: \"{}\", ",
                "request: \"{}\", response: \"{}\" }},\n",
            ),
            escape_rust_string(&route.method),
            escape_rust_string(&route.path),
            escape_rust_string(&route.source),
            escape_rust_string(&route.request),
            escape_rust_string(&route.response)
        ));
    }
    output.push_str("];\n");

    fs::write(&out_path, output)
        .unwrap_or_else(|err| panic!("failed to write {}: {}", out_path.display(), err));
}
