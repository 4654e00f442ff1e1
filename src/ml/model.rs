// ============================================================
// Layer 5 — AWD-LSTM Text Classifier
// ============================================================
// Encoder:
//   token embedding [n_tok, emb_sz]
//     → LSTM(emb_sz → n_hid) → LSTM(n_hid → n_hid) → LSTM(n_hid → emb_sz)
//
// The sequence is fed in bptt-sized chunks with the recurrent state
// carried across chunks. Only the outputs of the last `max_seq`
// timesteps (rounded to whole chunks) are kept, which bounds memory
// on very long documents the same way the language model was used.
//
// LSTM parameters use the PyTorch layout ([4H, I] / [4H, H], gate
// order input, forget, cell, output) so a pretrained state dict maps
// onto them one-to-one.
//
// Head:
//   concat-pool [3 * emb_sz] → Linear(50) → ReLU → Linear(n_class)
//   with dropout in front of each linear layer.
//
// Reference: Merity et al. (2017) AWD-LSTM
//            Howard & Ruder (2018) ULMFiT

use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{activation, Distribution},
};

use crate::infra::weights::{WeightLoader, EMBEDDING_KEY};
use crate::ml::pooling::concat_pool;

#[derive(Config, Debug)]
pub struct EncoderConfig {
    /// Vocabulary size, read from the pretrained embedding matrix
    pub n_tok: usize,
    #[config(default = 400)]
    pub emb_sz: usize,
    #[config(default = 1150)]
    pub n_hid: usize,
    #[config(default = 3)]
    pub n_layers: usize,
    #[config(default = 70)]
    pub bptt: usize,
    #[config(default = 1400)]
    pub max_seq: usize,
    #[config(default = 1)]
    pub pad_token: usize,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RnnEncoder<B> {
        let embedding = TokenEmbedding::new(self.n_tok, self.emb_sz, device);
        let rnns = (0..self.n_layers)
            .map(|l| {
                let d_input  = if l == 0 { self.emb_sz } else { self.n_hid };
                let d_hidden = if l + 1 == self.n_layers { self.emb_sz } else { self.n_hid };
                LstmLayer::new(d_input, d_hidden, device)
            })
            .collect();

        RnnEncoder {
            embedding,
            rnns,
            bptt:    self.bptt.max(1),
            max_seq: self.max_seq.max(1),
        }
    }

    /// Width of the pooled document embedding (last ‖ max ‖ mean).
    pub fn pooled_dim(&self) -> usize {
        3 * self.emb_sz
    }
}

#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub encoder: EncoderConfig,
    pub n_class: usize,
    #[config(default = 50)]
    pub head_hidden: usize,
    #[config(default = 0.1)]
    pub head_dropout: f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        let sizes = [self.encoder.pooled_dim(), self.head_hidden, self.n_class.max(1)];
        let layers = sizes
            .windows(2)
            .map(|w| LinearConfig::new(w[0], w[1]).init(device))
            .collect();
        let dropouts = (0..sizes.len() - 1)
            .map(|_| DropoutConfig::new(self.head_dropout).init())
            .collect();

        TextClassifier {
            encoder: self.encoder.init(device),
            head:    PoolingHead { layers, dropouts },
        }
    }
}

// ─── Token Embedding ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TokenEmbedding<B: Backend> {
    pub weight: Param<Tensor<B, 2>>,
}

impl<B: Backend> TokenEmbedding<B> {
    pub fn new(n_tok: usize, d_model: usize, device: &B::Device) -> Self {
        let weight = Tensor::random([n_tok, d_model], Distribution::Uniform(-0.1, 0.1), device);
        Self { weight: Param::from_tensor(weight) }
    }

    /// [batch, seq] → [batch, seq, d_model]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        burn::tensor::module::embedding(self.weight.val(), tokens)
    }
}

// ─── LSTM Layer ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LstmLayer<B: Backend> {
    /// [4 * d_hidden, d_input]
    pub weight_ih: Param<Tensor<B, 2>>,
    /// [4 * d_hidden, d_hidden]
    pub weight_hh: Param<Tensor<B, 2>>,
    pub bias_ih:   Param<Tensor<B, 1>>,
    pub bias_hh:   Param<Tensor<B, 1>>,
    pub d_input:   usize,
    pub d_hidden:  usize,
}

/// Recurrent state carried between bptt chunks. Both [batch, d_hidden].
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell:   Tensor<B, 2>,
}

impl<B: Backend> LstmLayer<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        let k    = 1.0 / (d_hidden as f64).sqrt();
        let dist = || Distribution::Uniform(-k, k);
        Self {
            weight_ih: Param::from_tensor(Tensor::random([4 * d_hidden, d_input], dist(), device)),
            weight_hh: Param::from_tensor(Tensor::random([4 * d_hidden, d_hidden], dist(), device)),
            bias_ih:   Param::from_tensor(Tensor::random([4 * d_hidden], dist(), device)),
            bias_hh:   Param::from_tensor(Tensor::random([4 * d_hidden], dist(), device)),
            d_input,
            d_hidden,
        }
    }

    /// x: [batch, seq, d_input] → ([batch, seq, d_hidden], final state)
    pub fn forward(
        &self,
        x:     Tensor<B, 3>,
        state: Option<LstmState<B>>,
    ) -> (Tensor<B, 3>, LstmState<B>) {
        let [batch, seq, _] = x.dims();
        let h  = self.d_hidden;
        let h4 = 4 * h;
        let device = x.device();

        let (mut hidden, mut cell) = match state {
            Some(s) => (s.hidden, s.cell),
            None => (
                Tensor::zeros([batch, h], &device),
                Tensor::zeros([batch, h], &device),
            ),
        };

        // Input projection for every timestep in one matmul
        let x_proj = x
            .reshape([batch * seq, self.d_input])
            .matmul(self.weight_ih.val().transpose())
            .reshape([batch, seq, h4]);
        let bias   = (self.bias_ih.val() + self.bias_hh.val()).unsqueeze::<2>();
        let w_hh_t = self.weight_hh.val().transpose();

        let mut outputs = Vec::with_capacity(seq);
        for t in 0..seq {
            let gates = x_proj
                .clone()
                .slice([0..batch, t..t + 1, 0..h4])
                .reshape([batch, h4])
                + hidden.clone().matmul(w_hh_t.clone())
                + bias.clone();

            let input_gate  = activation::sigmoid(gates.clone().slice([0..batch, 0..h]));
            let forget_gate = activation::sigmoid(gates.clone().slice([0..batch, h..2 * h]));
            let candidate   = gates.clone().slice([0..batch, 2 * h..3 * h]).tanh();
            let output_gate = activation::sigmoid(gates.slice([0..batch, 3 * h..h4]));

            cell   = forget_gate * cell + input_gate * candidate;
            hidden = output_gate * cell.clone().tanh();

            outputs.push(hidden.clone().unsqueeze_dim::<3>(1));
        }

        (Tensor::cat(outputs, 1), LstmState { hidden, cell })
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct RnnEncoder<B: Backend> {
    pub embedding: TokenEmbedding<B>,
    pub rnns:      Vec<LstmLayer<B>>,
    pub bptt:      usize,
    pub max_seq:   usize,
}

/// Final-layer hidden states for the retained window of timesteps.
#[derive(Debug, Clone)]
pub struct EncoderOutput<B: Backend> {
    /// [batch, window, emb_sz]
    pub hidden: Tensor<B, 3>,
    /// Padded input length the window was cut from
    pub padded_len: usize,
    /// Index of the first retained timestep in the padded input
    pub offset: usize,
}

impl<B: Backend> RnnEncoder<B> {
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> EncoderOutput<B> {
        let [batch, seq_len] = tokens.dims();

        // State starts from zeros for every batch
        let mut states: Vec<Option<LstmState<B>>> = self.rnns.iter().map(|_| None).collect();
        let mut kept   = Vec::new();
        let mut offset = None;

        let mut start = 0;
        while start < seq_len {
            let end   = (start + self.bptt).min(seq_len);
            let chunk = tokens.clone().slice([0..batch, start..end]);

            let mut x = self.embedding.forward(chunk);
            for (layer, state) in self.rnns.iter().zip(states.iter_mut()) {
                let (out, next) = layer.forward(x, state.take());
                *state = Some(next);
                x = out;
            }

            if start + self.max_seq > seq_len || end == seq_len {
                offset.get_or_insert(start);
                kept.push(x);
            }
            start = end;
        }

        EncoderOutput {
            hidden:     Tensor::cat(kept, 1),
            padded_len: seq_len,
            offset:     offset.unwrap_or(0),
        }
    }

    /// Pooled document embeddings [batch, 3 * emb_sz].
    pub fn embed(&self, tokens: Tensor<B, 2, Int>, lengths: &[usize]) -> Tensor<B, 2> {
        let out = self.forward(tokens);
        concat_pool(out.hidden, lengths, out.padded_len, out.offset)
    }

    /// Disable gradient tracking for every encoder parameter.
    pub fn freeze(self) -> Self {
        self.no_grad()
    }

    /// Copy matching pretrained parameters in; leave the rest as initialised.
    pub fn load_pretrained(self, loader: &mut WeightLoader<'_>) -> Self {
        let Self { embedding, rnns, bptt, max_seq } = self;

        let embedding = match loader.take_2d(&[EMBEDDING_KEY.to_string()], embedding.weight.val()) {
            Some(w) => TokenEmbedding { weight: Param::from_tensor(w) },
            None    => embedding,
        };

        let rnns = rnns
            .into_iter()
            .enumerate()
            .map(|(l, layer)| {
                let prefix = format!("encoder.rnns.{l}.module");
                let LstmLayer { weight_ih, weight_hh, bias_ih, bias_hh, d_input, d_hidden } = layer;

                let weight_ih = loader
                    .take_2d(&[format!("{prefix}.weight_ih_l0")], weight_ih.val())
                    .map(Param::from_tensor)
                    .unwrap_or(weight_ih);
                // AWD-LSTM keeps the pre-dropconnect matrix under `_raw`
                let weight_hh = loader
                    .take_2d(
                        &[format!("{prefix}.weight_hh_l0_raw"), format!("{prefix}.weight_hh_l0")],
                        weight_hh.val(),
                    )
                    .map(Param::from_tensor)
                    .unwrap_or(weight_hh);
                let bias_ih = loader
                    .take_1d(&[format!("{prefix}.bias_ih_l0")], bias_ih.val())
                    .map(Param::from_tensor)
                    .unwrap_or(bias_ih);
                let bias_hh = loader
                    .take_1d(&[format!("{prefix}.bias_hh_l0")], bias_hh.val())
                    .map(Param::from_tensor)
                    .unwrap_or(bias_hh);

                LstmLayer { weight_ih, weight_hh, bias_ih, bias_hh, d_input, d_hidden }
            })
            .collect();

        Self { embedding, rnns, bptt, max_seq }
    }
}

// ─── Classifier Head ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct PoolingHead<B: Backend> {
    pub layers:   Vec<Linear<B>>,
    pub dropouts: Vec<Dropout>,
}

impl<B: Backend> PoolingHead<B> {
    /// [batch, 3 * emb_sz] → [batch, n_class]
    pub fn forward(&self, pooled: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = pooled;
        for (i, (linear, dropout)) in self.layers.iter().zip(&self.dropouts).enumerate() {
            x = linear.forward(dropout.forward(x));
            if i < last {
                x = activation::relu(x);
            }
        }
        x
    }
}

#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub encoder: RnnEncoder<B>,
    pub head:    PoolingHead<B>,
}

impl<B: Backend> TextClassifier<B> {
    /// tokens: [batch, seq] (left-padded) → logits [batch, n_class]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>, lengths: &[usize]) -> Tensor<B, 2> {
        self.head.forward(self.encoder.embed(tokens, lengths))
    }

    /// Apply pretrained encoder weights; the head keeps its initialisation.
    pub fn load_pretrained(self, loader: &mut WeightLoader<'_>) -> Self {
        Self {
            encoder: self.encoder.load_pretrained(loader),
            head:    self.head,
        }
    }

    pub fn freeze_encoder(self) -> Self {
        Self {
            encoder: self.encoder.freeze(),
            head:    self.head,
        }
    }
}
