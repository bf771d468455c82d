//! Editor modals for services and prices.
//!
//! A modal is `Closed`, `Create` (blank form, no backing record) or `Edit`
//! (form filled from a loaded record whose id is fixed). Forms hold raw text
//! the way an HTML form would; conversion to a record happens on submit.

use std::collections::BTreeMap;

use models::{Environment, Price, PriceTable, Product, Service, REGION_CODES};

use crate::errors::ClientError;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ModalMode<F> {
    #[default]
    Closed,
    Create(F),
    Edit { id: String, form: F },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditorModal<F> {
    mode: ModalMode<F>,
    error: Option<String>,
}

impl<F> Default for EditorModal<F> {
    fn default() -> Self {
        Self { mode: ModalMode::Closed, error: None }
    }
}

impl<F> EditorModal<F> {
    pub fn open_create(&mut self, form: F) {
        self.mode = ModalMode::Create(form);
        self.error = None;
    }

    pub fn open_edit(&mut self, id: impl Into<String>, form: F) {
        self.mode = ModalMode::Edit { id: id.into(), form };
        self.error = None;
    }

    /// Close and discard whatever was typed.
    pub fn close(&mut self) {
        self.mode = ModalMode::Closed;
        self.error = None;
    }

    pub fn mode(&self) -> &ModalMode<F> {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.mode, ModalMode::Closed)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, ModalMode::Edit { .. })
    }

    /// Id of the record being edited.
    pub fn backing_id(&self) -> Option<&str> {
        match &self.mode {
            ModalMode::Edit { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&F> {
        match &self.mode {
            ModalMode::Closed => None,
            ModalMode::Create(form) | ModalMode::Edit { form, .. } => Some(form),
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut F> {
        match &mut self.mode {
            ModalMode::Closed => None,
            ModalMode::Create(form) | ModalMode::Edit { form, .. } => Some(form),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

// ===== Services =====

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductForm {
    pub nome_produto: String,
    pub preco: String,
    pub quantidade: String,
    pub descricao: String,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self { nome_produto: String::new(), preco: String::new(), quantidade: "1".into(), descricao: String::new() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceForm {
    pub id: String,
    pub codigo: String,
    pub tipo: String,
    pub servico: String,
    pub categoria: String,
    pub subcategoria: String,
    pub segmento: String,
    pub versao: String,
    pub edicao: String,
    pub imagem: String,
    pub produtos: Vec<ProductForm>,
}

impl ServiceForm {
    pub fn from_service(s: &Service) -> Self {
        Self {
            id: s.id.clone(),
            codigo: if s.codigo == 0 { String::new() } else { s.codigo.to_string() },
            tipo: s.tipo.clone(),
            servico: s.servico.clone(),
            categoria: s.categoria.clone(),
            subcategoria: s.subcategoria.clone(),
            segmento: s.segmento.clone(),
            versao: s.versao.clone(),
            edicao: s.edicao.clone(),
            imagem: s.imagem.clone(),
            produtos: s
                .produto
                .iter()
                .map(|p| ProductForm {
                    nome_produto: p.nome_produto.clone(),
                    preco: if p.preco == 0.0 { String::new() } else { p.preco.to_string() },
                    quantidade: if p.quantidade == 0 { "1".into() } else { p.quantidade.to_string() },
                    descricao: p.descricao.clone(),
                })
                .collect(),
        }
    }

    pub fn add_product(&mut self) {
        self.produtos.push(ProductForm::default());
    }

    pub fn remove_product(&mut self, index: usize) {
        if index < self.produtos.len() {
            self.produtos.remove(index);
        }
    }

    /// Build the record to submit. Rows without a product name are dropped.
    pub fn to_service(&self) -> Result<Service, ClientError> {
        require(&[
            ("id", &self.id),
            ("tipo", &self.tipo),
            ("servico", &self.servico),
            ("categoria", &self.categoria),
            ("segmento", &self.segmento),
        ])?;
        let produto = self
            .produtos
            .iter()
            .filter(|p| !p.nome_produto.is_empty())
            .map(|p| Product {
                nome_produto: p.nome_produto.clone(),
                preco: parse_leading_float(&p.preco).unwrap_or(0.0),
                quantidade: parse_leading_int(&p.quantidade).filter(|v| *v != 0).unwrap_or(1),
                descricao: p.descricao.clone(),
            })
            .collect();
        Ok(Service {
            id: self.id.clone(),
            codigo: parse_leading_int(&self.codigo).unwrap_or(0),
            tipo: self.tipo.clone(),
            servico: self.servico.clone(),
            categoria: self.categoria.clone(),
            subcategoria: self.subcategoria.clone(),
            segmento: self.segmento.clone(),
            versao: self.versao.clone(),
            edicao: self.edicao.clone(),
            imagem: self.imagem.clone(),
            produto,
            ..Default::default()
        })
    }
}

// ===== Prices =====

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceForm {
    pub id: String,
    pub code: String,
    pub um: String,
    /// Region code to raw input, per environment.
    pub hml: BTreeMap<String, String>,
    pub prd: BTreeMap<String, String>,
}

impl PriceForm {
    pub fn from_price(p: &Price) -> Self {
        // only known regions have an input to land in
        let known = |m: &BTreeMap<String, String>| -> BTreeMap<String, String> {
            m.iter()
                .filter(|(region, _)| REGION_CODES.contains(&region.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        Self {
            id: p.id.clone(),
            code: p.code.clone(),
            um: p.um.clone(),
            hml: known(&p.prices.hml),
            prd: known(&p.prices.prd),
        }
    }

    pub fn inputs_mut(&mut self, env: Environment) -> &mut BTreeMap<String, String> {
        match env {
            Environment::Homologation => &mut self.hml,
            Environment::Production => &mut self.prd,
        }
    }

    pub fn set_region(&mut self, env: Environment, region: &str, value: impl Into<String>) {
        self.inputs_mut(env).insert(region.to_string(), value.into());
    }

    /// Build the record to submit: inputs trimmed, blank ones left out.
    pub fn to_price(&self) -> Result<Price, ClientError> {
        require(&[("id", &self.id), ("code", &self.code)])?;
        let collect = |inputs: &BTreeMap<String, String>| -> BTreeMap<String, String> {
            REGION_CODES
                .iter()
                .filter_map(|region| {
                    let value = inputs.get(*region)?.trim();
                    (!value.is_empty()).then(|| (region.to_string(), value.to_string()))
                })
                .collect()
        };
        Ok(Price {
            id: self.id.clone(),
            code: self.code.clone(),
            um: self.um.clone(),
            prices: PriceTable { hml: collect(&self.hml), prd: collect(&self.prd), ..Default::default() },
            ..Default::default()
        })
    }
}

fn require(fields: &[(&str, &String)]) -> Result<(), ClientError> {
    let missing: Vec<&str> = fields.iter().filter(|(_, v)| v.trim().is_empty()).map(|(name, _)| *name).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Form(format!("Missing required fields: {}", missing.join(", "))))
    }
}

/// Longest numeric prefix of `s` after leading whitespace. A decimal part
/// and exponent are only accepted when `fractional`.
fn numeric_prefix(s: &str, fractional: bool) -> &str {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let int_digits = digits(end);
    end += int_digits;
    if !fractional {
        return if int_digits == 0 { "" } else { &s[..end] };
    }
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return "";
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    &s[..end]
}

/// Integer from the leading digits of `s` ("12abc" is 12); `None` if there are none.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    numeric_prefix(s, false).parse().ok()
}

/// Float from the leading numeric text of `s` ("2.5kg" is 2.5); `None` if there is none.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    numeric_prefix(s, true).parse().ok().filter(|v: &f64| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_service_form() -> ServiceForm {
        ServiceForm {
            id: "svc1".into(),
            tipo: "T".into(),
            servico: "S".into(),
            categoria: "A".into(),
            segmento: "X".into(),
            ..Default::default()
        }
    }

    #[test]
    fn leading_number_parsing() {
        assert_eq!(parse_leading_int(" 12abc"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("4.9"), Some(4));
        assert_eq!(parse_leading_float("2.5kg"), Some(2.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("-."), None);
    }

    #[test]
    fn numeric_fields_fall_back_to_defaults() {
        let mut form = filled_service_form();
        form.codigo = "abc".into();
        form.produtos = vec![
            ProductForm { nome_produto: "Kit".into(), preco: "x".into(), quantidade: "0".into(), descricao: "".into() },
            ProductForm { nome_produto: "Box".into(), preco: "9.90".into(), quantidade: "3 un".into(), descricao: "d".into() },
        ];
        let svc = form.to_service().unwrap();
        assert_eq!(svc.codigo, 0);
        assert_eq!(svc.produto[0].preco, 0.0);
        assert_eq!(svc.produto[0].quantidade, 1);
        assert_eq!(svc.produto[1].preco, 9.9);
        assert_eq!(svc.produto[1].quantidade, 3);
    }

    #[test]
    fn unnamed_products_are_dropped() {
        let mut form = filled_service_form();
        form.add_product();
        form.produtos.push(ProductForm { nome_produto: "Kit".into(), ..Default::default() });
        let svc = form.to_service().unwrap();
        assert_eq!(svc.produto.len(), 1);
        assert_eq!(svc.produto[0].nome_produto, "Kit");
    }

    #[test]
    fn required_service_fields_are_reported() {
        let form = ServiceForm { id: "svc1".into(), tipo: " ".into(), ..Default::default() };
        let err = form.to_service().unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: tipo, servico, categoria, segmento");
    }

    #[test]
    fn price_inputs_are_trimmed_and_blank_ones_omitted() {
        let mut form = PriceForm { id: "p1".into(), code: "C1".into(), ..Default::default() };
        form.set_region(Environment::Homologation, "SP", " 10.00 ");
        form.set_region(Environment::Homologation, "RJ", "   ");
        form.set_region(Environment::Production, "MG", "7");
        form.set_region(Environment::Production, "XX", "1");
        let price = form.to_price().unwrap();
        assert_eq!(price.prices.hml, BTreeMap::from([("SP".to_string(), "10.00".to_string())]));
        assert_eq!(price.prices.prd, BTreeMap::from([("MG".to_string(), "7".to_string())]));
    }

    #[test]
    fn price_form_round_trips_a_record() {
        let mut price = Price { id: "p1".into(), code: "C1".into(), um: "UN".into(), ..Default::default() };
        price.prices.prd.insert("SP".into(), "5.00".into());
        let form = PriceForm::from_price(&price);
        assert_eq!(form.prd.get("SP").map(String::as_str), Some("5.00"));
        assert_eq!(form.to_price().unwrap().prices, price.prices);
    }

    #[test]
    fn modal_transitions() {
        let mut modal: EditorModal<ServiceForm> = EditorModal::default();
        assert!(!modal.is_open());
        modal.open_create(ServiceForm::default());
        assert!(modal.is_open() && !modal.is_editing());
        assert_eq!(modal.backing_id(), None);

        modal.set_error("boom");
        modal.open_edit("svc1", filled_service_form());
        assert_eq!(modal.backing_id(), Some("svc1"));
        assert_eq!(modal.error(), None);

        modal.form_mut().unwrap().tipo = "changed".into();
        assert_eq!(modal.form().unwrap().tipo, "changed");
        modal.close();
        assert_eq!(modal.mode(), &ModalMode::Closed);
    }
}
